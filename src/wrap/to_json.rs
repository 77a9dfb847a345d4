use super::{Callable, CallableExt, Wrapper};
use crate::encoder;
use serde::Serialize;
use std::fmt::Debug;

/// Replaces the wrapped function's return value with its JSON text,
/// encoded by [`encoder::to_string`]. Errors pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToJson;

impl<C> Wrapper<C> for ToJson {
    type Wrapped = Encoded<C>;

    fn wrap(self, inner: C) -> Encoded<C> {
        Encoded { inner }
    }
}

pub fn to_json<C>(inner: C) -> Encoded<C> {
    ToJson.wrap(inner)
}

/// A callable wrapped by [`ToJson`].
#[derive(Debug, Clone)]
pub struct Encoded<C> {
    inner: C,
}

impl<C> CallableExt for Encoded<C> {}

impl<A, C> Callable<A> for Encoded<C>
where
    C: Callable<A>,
    C::Output: Serialize + Debug,
{
    type Output = String;
    type Error = C::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    #[track_caller]
    fn call(&self, args: A) -> Result<String, C::Error> {
        self.inner.call(args).map(|value| encoder::to_string(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrap::{func, infallible};
    use chrono::NaiveDate;
    use serde_json::json;

    #[derive(Debug, Serialize)]
    struct Payload {
        data: Vec<u8>,
        due: NaiveDate,
    }

    #[test]
    fn return_value_becomes_json_text() {
        let build = to_json(infallible("build", |n: u8| Payload {
            data: vec![n; 2],
            due: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }));

        let text = build.call(4).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"data": [4, 4], "due": "2024-01-31"}));
    }

    #[test]
    fn errors_are_not_encoded() {
        let fail = func("fail", |_: ()| Err::<u8, _>("bad input")).with(ToJson);
        assert_eq!(fail.call(()), Err("bad input"));
    }

    #[test]
    fn missing_value_encodes_as_null() {
        let nothing = infallible("nothing", |_: ()| Option::<u8>::None).with(ToJson);
        assert_eq!(nothing.call(()).unwrap(), "null");
    }
}
