// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Matching selectors against resource listings.

use std::fmt;

use regex::Regex;
use serde::de::Error as DeserError;
use serde::{Deserialize, Deserializer};

use super::super::Result;

/// Something that has an ID and a name.
pub trait Resource {
    /// Unique ID of the resource.
    fn id(&self) -> &str;

    /// Human-readable name of the resource.
    fn name(&self) -> &str;
}

/// A selector for a resource: either an exact ID/name or a name pattern.
///
/// When deserialized from a string, a value enclosed in slashes (e.g.
/// `/^ubuntu-2[24]/`) is treated as a regular expression, anything else
/// as an exact selector.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Matches a resource whose ID or name is equal to the value.
    Exact(String),
    /// Matches a resource whose name matches the expression.
    Pattern(Regex),
}

impl Selector {
    /// Create an exact selector.
    #[inline]
    pub fn exact<S: Into<String>>(value: S) -> Selector {
        Selector::Exact(value.into())
    }

    /// Create a pattern selector from a regular expression.
    pub fn pattern<S: AsRef<str>>(expr: S) -> Result<Selector> {
        Ok(Selector::Pattern(Regex::new(expr.as_ref())?))
    }

    /// Parse a selector, treating `/.../` as a pattern.
    pub fn parse<S: AsRef<str>>(value: S) -> Result<Selector> {
        let value = value.as_ref();
        match value
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(expr) => Selector::pattern(expr),
            None => Ok(Selector::exact(value)),
        }
    }

    /// Whether the selector is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Selector::Exact(value) => value.is_empty(),
            Selector::Pattern(expr) => expr.as_str().is_empty(),
        }
    }

    /// Check whether the resource matches this selector.
    pub fn matches<T: Resource + ?Sized>(&self, item: &T) -> bool {
        match self {
            Selector::Exact(value) => item.id() == value || item.name() == value,
            Selector::Pattern(expr) => expr.is_match(item.name()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Exact(value) => f.write_str(value),
            Selector::Pattern(expr) => write!(f, "/{}/", expr.as_str()),
        }
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Selector {
        Selector::exact(value)
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Selector {
        Selector::Exact(value)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<Selector, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Selector::parse(value).map_err(DeserError::custom)
    }
}

/// Find the first resource matching the selector.
///
/// Resources are checked in listing order, so when one resource matches by ID
/// and another by name, whichever comes first wins.
pub fn find_match<'a, T, I>(items: I, selector: &Selector) -> Option<&'a T>
where
    T: Resource + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().find(|item| selector.matches(*item))
}
