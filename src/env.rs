// ABOUTME: Persistent runtime environment of name-to-value frames

use crate::value::Value;
use std::rc::Rc;

/// A chain of immutable binding frames with inner-frame shadowing.
/// Extension prepends a frame and never mutates the existing chain, so
/// any number of closures can share a suffix.
#[derive(Debug, Clone, Default)]
pub struct Env {
    head: Option<Rc<Frame>>,
}

#[derive(Debug)]
struct Frame {
    name: String,
    value: Value,
    parent: Env,
}

impl Env {
    pub fn empty() -> Self {
        Env { head: None }
    }

    /// A new environment with one more binding in front.
    pub fn extend(&self, name: impl Into<String>, value: Value) -> Env {
        Env {
            head: Some(Rc::new(Frame {
                name: name.into(),
                value,
                parent: self.clone(),
            })),
        }
    }

    /// Walk inner to outer and return the first match.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut cursor = self.head.as_deref();
        while let Some(frame) = cursor {
            if frame.name == name {
                return Some(frame.value.clone());
            }
            cursor = frame.parent.head.as_deref();
        }
        None
    }
}
