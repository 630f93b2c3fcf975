/*
 * router.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Centralino, an asynchronous HTTP and WebSocket
 * toolkit.
 *
 * Centralino is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Centralino is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Centralino.  If not, see <http://www.gnu.org/licenses/>.
 */

//! URL router: ordered regex patterns with typed capture extraction.
//!
//! Patterns are regex literals; each capture group feeds one typed handler
//! parameter. Regexes are compiled once, at router construction, and matched
//! in full-match mode in declaration order: the first pattern whose regex
//! matches the whole URL wins. A URL match with the wrong method records
//! MethodNotAllowed and keeps looking; captures that fail to convert are a
//! BadRequest.
//!
//! Handlers share a context type `C` (the optional per-connection state)
//! and a return type `R`, the sum of handler results, chosen by the
//! embedder: an enum, a response struct, or a boxed future.

use regex::{Captures, Regex};

use crate::http::message::Method;

/// Router dispatch outcomes that are not a handler result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// No pattern matched the URL.
    NotFound,
    /// A pattern matched the URL but its method filter did not.
    MethodNotAllowed,
    /// A capture could not be converted to its parameter type.
    BadRequest(String),
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::NotFound => write!(f, "not found"),
            RouteError::MethodNotAllowed => write!(f, "method not allowed"),
            RouteError::BadRequest(msg) => write!(f, "bad request: {}", msg),
        }
    }
}

impl std::error::Error for RouteError {}

/// Conversion from one capture to one typed handler parameter.
pub trait FromParam: Sized {
    fn from_param(input: &str) -> Result<Self, String>;
}

macro_rules! from_param_via_fromstr {
    ($($t:ty),*) => {
        $(impl FromParam for $t {
            fn from_param(input: &str) -> Result<Self, String> {
                input
                    .parse::<$t>()
                    .map_err(|_| format!("{:?} is not a valid {}", input, stringify!($t)))
            }
        })*
    };
}

from_param_via_fromstr!(i32, i64, u16, u32, u64, f64);

impl FromParam for String {
    fn from_param(input: &str) -> Result<Self, String> {
        Ok(input.to_string())
    }
}

/// `yes`, `on`, and `true` (case-insensitive) are true; everything else is
/// false.
impl FromParam for bool {
    fn from_param(input: &str) -> Result<Self, String> {
        Ok(["yes", "on", "true"]
            .iter()
            .any(|t| input.eq_ignore_ascii_case(t)))
    }
}

/// A parameter that may span path segments (any non-empty run including
/// slashes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam(pub String);

impl FromParam for PathParam {
    fn from_param(input: &str) -> Result<Self, String> {
        if input.is_empty() {
            return Err("empty path parameter".to_string());
        }
        Ok(PathParam(input.to_string()))
    }
}

/// Conversion from the full capture set to the handler's parameter tuple.
/// Group 1 feeds the first parameter, group 2 the second, and so on.
pub trait FromCaptures: Sized {
    fn from_captures(captures: &Captures<'_>) -> Result<Self, RouteError>;
}

fn capture<'a>(captures: &'a Captures<'_>, index: usize) -> Result<&'a str, RouteError> {
    captures
        .get(index)
        .map(|m| m.as_str())
        .ok_or_else(|| RouteError::BadRequest(format!("missing capture group {}", index)))
}

impl FromCaptures for () {
    fn from_captures(_captures: &Captures<'_>) -> Result<Self, RouteError> {
        Ok(())
    }
}

macro_rules! from_captures_tuple {
    ($($t:ident : $idx:expr),+) => {
        impl<$($t: FromParam),+> FromCaptures for ($($t,)+) {
            fn from_captures(captures: &Captures<'_>) -> Result<Self, RouteError> {
                Ok(($(
                    $t::from_param(capture(captures, $idx)?)
                        .map_err(RouteError::BadRequest)?,
                )+))
            }
        }
    };
}

from_captures_tuple!(T1: 1);
from_captures_tuple!(T1: 1, T2: 2);
from_captures_tuple!(T1: 1, T2: 2, T3: 3);
from_captures_tuple!(T1: 1, T2: 2, T3: 3, T4: 4);
from_captures_tuple!(T1: 1, T2: 2, T3: 3, T4: 4, T5: 5);

type Handler<C, R> = Box<dyn Fn(&mut C, &Captures<'_>) -> Result<R, RouteError> + Send + Sync>;

struct Route<C, R> {
    method: Option<Method>,
    pattern: Regex,
    handler: Handler<C, R>,
}

/// Ordered route table. Built once; dispatch is read-only.
pub struct Router<C, R> {
    routes: Vec<Route<C, R>>,
}

impl<C, R> Default for Router<C, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, R> Router<C, R> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a pattern for any method. Panics on an invalid pattern;
    /// patterns are literals fixed at build time.
    pub fn route<A, F>(self, pattern: &str, handler: F) -> Self
    where
        A: FromCaptures,
        F: Fn(&mut C, A) -> R + Send + Sync + 'static,
    {
        self.add(None, pattern, handler)
    }

    /// Register a pattern with a method filter.
    pub fn route_method<A, F>(self, method: Method, pattern: &str, handler: F) -> Self
    where
        A: FromCaptures,
        F: Fn(&mut C, A) -> R + Send + Sync + 'static,
    {
        self.add(Some(method), pattern, handler)
    }

    fn add<A, F>(mut self, method: Option<Method>, pattern: &str, handler: F) -> Self
    where
        A: FromCaptures,
        F: Fn(&mut C, A) -> R + Send + Sync + 'static,
    {
        // anchored: dispatch is full-match
        let anchored = format!("\\A(?:{})\\z", pattern);
        let regex = Regex::new(&anchored).expect("invalid route pattern");
        self.routes.push(Route {
            method,
            pattern: regex,
            handler: Box::new(move |ctx, captures| {
                let args = A::from_captures(captures)?;
                Ok(handler(ctx, args))
            }),
        });
        self
    }

    /// Dispatch `url` for `method`: first full match in declaration order
    /// wins; see the module docs for the miss outcomes.
    pub fn dispatch(&self, method: Method, url: &str, context: &mut C) -> Result<R, RouteError> {
        let mut method_mismatch = false;
        for route in &self.routes {
            let captures = match route.pattern.captures(url) {
                Some(c) => c,
                None => continue,
            };
            if let Some(m) = route.method {
                if m != method {
                    method_mismatch = true;
                    continue;
                }
            }
            return (route.handler)(context, &captures);
        }
        if method_mismatch {
            Err(RouteError::MethodNotAllowed)
        } else {
            Err(RouteError::NotFound)
        }
    }
}
