//! Value converters and the typed handles callers read bound values from.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Capability every bindable flag or argument implements.
///
/// `from_text` is called once per occurrence; cumulative converters append,
/// scalar converters overwrite.
pub trait Value {
    /// Convert raw command-line text into the bound representation.
    fn from_text(&mut self, raw: &str) -> Result<(), String>;

    /// Boolean flags are bound without consuming a value token.
    fn is_bool_flag(&self) -> bool {
        false
    }

    /// Placeholder shown in usage for the value (e.g. `low|normal|high`).
    /// Empty means "derive one from the clause".
    fn placeholder_text(&self) -> String {
        String::new()
    }
}

/// Shared handle to a bound value.
///
/// The parser writes through one clone while the caller keeps another.
pub struct Binding<T>(Rc<RefCell<T>>);

impl<T> Binding<T> {
    pub fn new(initial: T) -> Self {
        Self(Rc::new(RefCell::new(initial)))
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

impl<T: Clone> Binding<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T: Default> Default for Binding<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.0.borrow()).finish()
    }
}

/// Parse the spellings accepted for booleans (`1`, `t`, `true`, `TRUE`, ...).
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(format!("'{raw}' is not a boolean")),
    }
}

pub(crate) struct StringValue(pub(crate) Binding<Option<String>>);

impl Value for StringValue {
    fn from_text(&mut self, raw: &str) -> Result<(), String> {
        self.0.set(Some(raw.to_string()));
        Ok(())
    }
}

pub(crate) struct StringsValue(pub(crate) Binding<Vec<String>>);

impl Value for StringsValue {
    fn from_text(&mut self, raw: &str) -> Result<(), String> {
        self.0.update(|values| values.push(raw.to_string()));
        Ok(())
    }
}

pub(crate) struct BoolValue(pub(crate) Binding<bool>);

impl Value for BoolValue {
    fn from_text(&mut self, raw: &str) -> Result<(), String> {
        self.0.set(parse_bool(raw)?);
        Ok(())
    }

    fn is_bool_flag(&self) -> bool {
        true
    }
}
