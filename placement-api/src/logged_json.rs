//! JSON data guard that logs what it parsed.
//!
//! Used for the bodies of mutating student, company and placement requests.
//! Bodies carrying passwords go through plain `Json<T>` instead.

use rocket::data::{self, FromData};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::{Data, Request};

/// Longest logged payload, in bytes; longer ones are cut.
const MAX_LOGGED_BODY: usize = 2048;

/// Drop-in replacement for `Json<T>` that logs the parsed body at info
/// level.
pub struct LoggedJson<T>(pub T);

impl<T> LoggedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for LoggedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn truncate_for_log(mut body: String) -> String {
    if body.len() > MAX_LOGGED_BODY {
        let mut cut = MAX_LOGGED_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

#[rocket::async_trait]
impl<'r, T: Deserialize<'r> + Serialize> FromData<'r> for LoggedJson<T> {
    type Error = rocket::serde::json::Error<'r>;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        match Json::<T>::from_data(req, data).await {
            data::Outcome::Success(json) => {
                let body = serde_json::to_string(&json.0)
                    .map(truncate_for_log)
                    .unwrap_or_else(|_| "<unserializable>".to_string());
                info!("Request body: {} {} | {}", req.method(), req.uri().path(), body);
                data::Outcome::Success(LoggedJson(json.into_inner()))
            }
            data::Outcome::Error(e) => {
                warn!("Rejected request body: {} {} | {:?}", req.method(), req.uri().path(), e.1);
                data::Outcome::Error(e)
            }
            data::Outcome::Forward(f) => data::Outcome::Forward(f),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for LoggedJson<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_bodies_untouched() {
        assert_eq!(truncate_for_log("{\"a\":1}".to_string()), "{\"a\":1}");
    }

    #[test]
    fn test_long_bodies_cut_on_char_boundary() {
        let body = "é".repeat(MAX_LOGGED_BODY);
        let cut = truncate_for_log(body);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= MAX_LOGGED_BODY + 3);
    }
}
