use serde::Serialize;

/// A desired value paired with the value it replaces.
///
/// `changed` is computed once, when the pair is built from an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    pub value: T,
    pub before: Option<T>,
    pub changed: bool,
}

impl<T: PartialEq> Tracked<T> {
    pub fn new(value: T, before: Option<T>) -> Self {
        let changed = before.as_ref() != Some(&value);
        Self {
            value,
            before,
            changed,
        }
    }

    /// A value with no previous state, as seen by Create.
    pub fn fresh(value: T) -> Self {
        Self::new(value, None)
    }
}

/// What an update request should say about an optional setting.
///
/// Athena keeps a setting when it is omitted from an update, so dropping
/// one needs an explicit remove flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Setting<T> {
    Unset,
    Present(T),
    Removed,
}

impl<T> Setting<T> {
    /// `previously_present` is true when the live resource or the old
    /// properties carried the setting.
    pub fn resolve(desired: Option<T>, previously_present: bool) -> Self {
        match desired {
            Some(value) => Setting::Present(value),
            None if previously_present => Setting::Removed,
            None => Setting::Unset,
        }
    }
}
