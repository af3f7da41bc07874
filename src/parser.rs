// ABOUTME: Recursive-descent parser building the expression tree from the token stream

use crate::ast::Expr;
use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind, TokenStream};
use std::rc::Rc;

/// Parse a complete program. The whole token stream must be consumed;
/// trailing tokens are a syntax fault.
pub fn parse(source: &str) -> Result<Expr, SyntaxError> {
    let mut parser = Parser::new(TokenStream::of_source(source));
    let expr = parser.expr()?;
    if !parser.tokens.at_end() {
        return Err(SyntaxError::UnexpectedToken(
            parser.tokens.peek().text.clone(),
        ));
    }
    Ok(expr)
}

/// One precedence level per method, each descending only to the next.
/// Lowest binds loosest: let, if/while, fn/rec, `;`, `:=`, orelse,
/// andalso, comparison, `::`, additive, multiplicative, application,
/// prefix operators, atoms.
struct Parser {
    tokens: TokenStream,
}

fn rc(e: Expr) -> Rc<Expr> {
    Rc::new(e)
}

impl Parser {
    fn new(tokens: TokenStream) -> Self {
        Parser { tokens }
    }

    fn expr(&mut self) -> Result<Expr, SyntaxError> {
        self.binding()
    }

    /// `let x = e1 in e2 end`
    fn binding(&mut self) -> Result<Expr, SyntaxError> {
        if self.tokens.eat_keyword("let") {
            let name = self.tokens.expect_ident()?;
            self.tokens.expect_symbol("=")?;
            let bound = self.expr()?;
            self.tokens.expect_keyword("in")?;
            let body = self.expr()?;
            self.tokens.expect_keyword("end")?;
            return Ok(Expr::Let(name, rc(bound), rc(body)));
        }
        self.conditional()
    }

    /// `if e1 then e2 else e3` and `while e1 do e2`
    fn conditional(&mut self) -> Result<Expr, SyntaxError> {
        if self.tokens.eat_keyword("if") {
            let cond = self.expr()?;
            self.tokens.expect_keyword("then")?;
            let then = self.expr()?;
            self.tokens.expect_keyword("else")?;
            let other = self.expr()?;
            return Ok(Expr::Cond(rc(cond), rc(then), rc(other)));
        }
        if self.tokens.eat_keyword("while") {
            let cond = self.expr()?;
            self.tokens.expect_keyword("do")?;
            let body = self.expr()?;
            return Ok(Expr::Loop(rc(cond), rc(body)));
        }
        self.abstraction()
    }

    /// `fn x => e` and `rec x => e`
    fn abstraction(&mut self) -> Result<Expr, SyntaxError> {
        if self.tokens.eat_keyword("fn") {
            let param = self.tokens.expect_ident()?;
            self.tokens.expect_symbol("=>")?;
            let body = self.expr()?;
            return Ok(Expr::Fn(param, rc(body)));
        }
        if self.tokens.eat_keyword("rec") {
            let name = self.tokens.expect_ident()?;
            self.tokens.expect_symbol("=>")?;
            let body = self.expr()?;
            return Ok(Expr::Rec(name, rc(body)));
        }
        self.sequence()
    }

    fn sequence(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.assignment()?;
        while self.tokens.eat_symbol(";") {
            let right = self.assignment()?;
            left = Expr::Seq(rc(left), rc(right));
        }
        Ok(left)
    }

    fn assignment(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.or_else()?;
        while self.tokens.eat_symbol(":=") {
            let right = self.or_else()?;
            left = Expr::Assign(rc(left), rc(right));
        }
        Ok(left)
    }

    fn or_else(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.and_also()?;
        while self.tokens.eat_word("orelse") {
            let right = self.and_also()?;
            left = Expr::OrElse(rc(left), rc(right));
        }
        Ok(left)
    }

    fn and_also(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.comparison()?;
        while self.tokens.eat_word("andalso") {
            let right = self.comparison()?;
            left = Expr::AndAlso(rc(left), rc(right));
        }
        Ok(left)
    }

    /// Comparisons are non-associative: at most one per level.
    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.cons()?;
        let tok = self.tokens.peek();
        if tok.kind == TokenKind::Symbol {
            let build = match tok.text.as_str() {
                "=" => Some(Expr::Eq as fn(Rc<Expr>, Rc<Expr>) -> Expr),
                "<>" => Some(Expr::Neq as fn(Rc<Expr>, Rc<Expr>) -> Expr),
                "<" => Some(Expr::Less as fn(Rc<Expr>, Rc<Expr>) -> Expr),
                "<=" => Some(Expr::LessEq as fn(Rc<Expr>, Rc<Expr>) -> Expr),
                ">" => Some(Expr::Greater as fn(Rc<Expr>, Rc<Expr>) -> Expr),
                ">=" => Some(Expr::GreaterEq as fn(Rc<Expr>, Rc<Expr>) -> Expr),
                _ => None,
            };
            if let Some(build) = build {
                self.tokens.advance();
                let right = self.cons()?;
                return Ok(build(rc(left), rc(right)));
            }
        }
        Ok(left)
    }

    /// `::` is right-associative.
    fn cons(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.additive()?;
        if self.tokens.eat_symbol("::") {
            let right = self.cons()?;
            return Ok(Expr::Cons(rc(left), rc(right)));
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.multiplicative()?;
        loop {
            if self.tokens.eat_symbol("+") {
                let right = self.multiplicative()?;
                left = Expr::Add(rc(left), rc(right));
            } else if self.tokens.eat_symbol("-") {
                let right = self.multiplicative()?;
                left = Expr::Sub(rc(left), rc(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.application()?;
        loop {
            if self.tokens.eat_symbol("*") {
                let right = self.application()?;
                left = Expr::Mul(rc(left), rc(right));
            } else if self.tokens.eat_symbol("/") {
                let right = self.application()?;
                left = Expr::Div(rc(left), rc(right));
            } else if self.tokens.eat_symbol("%") {
                let right = self.application()?;
                left = Expr::Mod(rc(left), rc(right));
            } else {
                return Ok(left);
            }
        }
    }

    /// Application is bare juxtaposition: keep consuming operands as
    /// long as the next token can begin an atom. Left-associative.
    fn application(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.prefix()?;
        while starts_atom(self.tokens.peek()) {
            let right = self.prefix()?;
            left = Expr::App(rc(left), rc(right));
        }
        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expr, SyntaxError> {
        if self.tokens.eat_word("not") {
            return Ok(Expr::Not(rc(self.prefix()?)));
        }
        if self.tokens.eat_symbol("~") {
            return Ok(Expr::Neg(rc(self.prefix()?)));
        }
        if self.tokens.eat_symbol("!") {
            return Ok(Expr::Deref(rc(self.prefix()?)));
        }
        if self.tokens.eat_word("ref") {
            return Ok(Expr::Ref(rc(self.prefix()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, SyntaxError> {
        let tok = self.tokens.advance();
        match tok.kind {
            TokenKind::Int => tok
                .text
                .parse::<i64>()
                .map(Expr::Int)
                .map_err(|_| SyntaxError::IntegerOutOfRange(tok.text)),
            TokenKind::Ident => Ok(match tok.text.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "nil" => Expr::Nil,
                _ => Expr::Name(tok.text),
            }),
            TokenKind::Symbol if tok.text == "(" => {
                if self.tokens.eat_symbol(")") {
                    return Ok(Expr::Unit);
                }
                let first = self.expr()?;
                if self.tokens.eat_symbol(",") {
                    let second = self.expr()?;
                    self.tokens.expect_symbol(")")?;
                    return Ok(Expr::Pair(rc(first), rc(second)));
                }
                self.tokens.expect_symbol(")")?;
                Ok(Expr::Group(rc(first)))
            }
            TokenKind::Eof => Err(SyntaxError::UnexpectedEof),
            _ => Err(SyntaxError::UnexpectedToken(tok.text)),
        }
    }
}

/// Tokens that may begin an application operand.
fn starts_atom(tok: &Token) -> bool {
    match tok.kind {
        TokenKind::Int | TokenKind::Ident => true,
        TokenKind::Symbol => matches!(tok.text.as_str(), "(" | "~" | "!"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Rc<Expr> {
        rc(Expr::Int(n))
    }

    fn name(x: &str) -> Rc<Expr> {
        rc(Expr::name(x))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let e = parse("1 + 2 * 3").unwrap();
        assert_eq!(e, Expr::Add(int(1), rc(Expr::Mul(int(2), int(3)))));
    }

    #[test]
    fn additive_is_left_associative() {
        let e = parse("1 - 2 + 3").unwrap();
        assert_eq!(e, Expr::Add(rc(Expr::Sub(int(1), int(2))), int(3)));
    }

    #[test]
    fn application_is_left_associative() {
        let e = parse("f x y").unwrap();
        assert_eq!(
            e,
            Expr::App(rc(Expr::App(name("f"), name("x"))), name("y"))
        );
    }

    #[test]
    fn application_binds_tighter_than_multiplication() {
        let e = parse("f x * 2").unwrap();
        assert_eq!(e, Expr::Mul(rc(Expr::App(name("f"), name("x"))), int(2)));
    }

    #[test]
    fn prefix_forms_can_be_application_operands() {
        let e = parse("f ~1").unwrap();
        assert_eq!(e, Expr::App(name("f"), rc(Expr::Neg(int(1)))));

        let e = parse("f !r").unwrap();
        assert_eq!(e, Expr::App(name("f"), rc(Expr::Deref(name("r")))));
    }

    #[test]
    fn cons_is_right_associative() {
        let e = parse("1 :: 2 :: nil").unwrap();
        assert_eq!(
            e,
            Expr::Cons(int(1), rc(Expr::Cons(int(2), rc(Expr::Nil))))
        );
    }

    #[test]
    fn comparison_is_non_associative() {
        assert!(parse("1 < 2").is_ok());
        assert!(parse("1 < 2 < 3").is_err());
    }

    #[test]
    fn sequence_and_assignment_nest() {
        let e = parse("r := 1 ; !r").unwrap();
        assert_eq!(
            e,
            Expr::Seq(
                rc(Expr::Assign(name("r"), int(1))),
                rc(Expr::Deref(name("r")))
            )
        );
    }

    #[test]
    fn parenthesised_forms() {
        assert_eq!(parse("()").unwrap(), Expr::Unit);
        assert_eq!(parse("(1)").unwrap(), Expr::Group(int(1)));
        assert_eq!(parse("(1, 2)").unwrap(), Expr::Pair(int(1), int(2)));
    }

    #[test]
    fn let_form() {
        let e = parse("let x = 1 in x end").unwrap();
        assert_eq!(e, Expr::Let("x".to_string(), int(1), name("x")));
    }

    #[test]
    fn conditional_and_loop_forms() {
        let e = parse("if true then 1 else 2").unwrap();
        assert_eq!(
            e,
            Expr::Cond(rc(Expr::Bool(true)), int(1), int(2))
        );

        let e = parse("while false do ()").unwrap();
        assert_eq!(e, Expr::Loop(rc(Expr::Bool(false)), rc(Expr::Unit)));
    }

    #[test]
    fn fn_and_rec_forms() {
        let e = parse("fn x => x").unwrap();
        assert_eq!(e, Expr::Fn("x".to_string(), name("x")));

        let e = parse("rec f => fn n => f n").unwrap();
        assert_eq!(
            e,
            Expr::Rec(
                "f".to_string(),
                rc(Expr::Fn(
                    "n".to_string(),
                    rc(Expr::App(name("f"), name("n")))
                ))
            )
        );
    }

    #[test]
    fn boolean_words_parse_at_their_levels() {
        let e = parse("true orelse false andalso true").unwrap();
        assert_eq!(
            e,
            Expr::OrElse(
                rc(Expr::Bool(true)),
                rc(Expr::AndAlso(rc(Expr::Bool(false)), rc(Expr::Bool(true))))
            )
        );
    }

    #[test]
    fn unterminated_let_is_rejected() {
        assert!(parse("let x = 1 in").is_err());
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(parse("1 + 2 )").is_err());
        assert!(matches!(parse(")"), Err(SyntaxError::UnexpectedToken(t)) if t == ")"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(parse(""), Err(SyntaxError::UnexpectedEof));
        assert_eq!(parse("(* only a comment *)"), Err(SyntaxError::UnexpectedEof));
    }
}
