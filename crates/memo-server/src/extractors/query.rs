use memo_core::Page;
use serde::Deserialize;

/// `?limit&offset` on list endpoints.
///
/// Values that are not integers fall back to the defaults rather than
/// rejecting the request.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PageQuery {
    limit: Option<String>,
    offset: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        Page::from_query(parse(&self.limit), parse(&self.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<&str>, offset: Option<&str>) -> PageQuery {
        PageQuery {
            limit: limit.map(String::from),
            offset: offset.map(String::from),
        }
    }

    #[test]
    fn test_defaults_when_absent() {
        let page = query(None, None).page();
        assert_eq!(page.limit(), 20);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_valid_values() {
        let page = query(Some("50"), Some("10")).page();
        assert_eq!(page.limit(), 50);
        assert_eq!(page.offset(), 10);
    }

    #[test]
    fn test_out_of_range_and_garbage_fall_back() {
        assert_eq!(query(Some("0"), None).page().limit(), 20);
        assert_eq!(query(Some("101"), None).page().limit(), 20);
        assert_eq!(query(Some("abc"), Some("-5")).page(), Page::default());
    }
}
