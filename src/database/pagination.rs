use serde::Serialize;

use crate::{error::ApiError, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub page_size: i64,
    pub max_page_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Turns `page` / `limit` query parameters into a bounded [`PageRequest`].
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> PaginationConfig {
        self.config
    }

    pub fn request(&self, query: &[(String, String)]) -> Result<PageRequest, ApiError> {
        let page = match query_value(query, "page") {
            Some(page) => match page.parse::<i64>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(ApiError::NotFound(String::from("Invalid page."))),
            },
            None => 1,
        };

        // A malformed limit falls back to the configured size instead of failing the request.
        let limit = query_value(query, "limit")
            .and_then(|limit| limit.parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .map(|limit| limit.min(self.config.max_page_size))
            .unwrap_or(self.config.page_size);

        // Pages whose offset does not fit a bigint cannot hold any rows.
        if (page - 1).checked_mul(limit).is_none() {
            return Err(ApiError::NotFound(String::from("Invalid page.")));
        }

        Ok(PageRequest { page, limit })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Everything needed to rebuild the current url with a different page number.
#[derive(Debug, Clone)]
pub struct PageLink {
    path: String,
    params: Vec<(String, String)>,
}

impl PageLink {
    pub fn new(path: &str, query: &[(String, String)]) -> Self {
        Self {
            path: path.to_string(),
            params: query
                .iter()
                .filter(|(key, _)| key != "page")
                .cloned()
                .collect(),
        }
    }

    pub fn to_page(&self, page: i64) -> String {
        let mut params: Vec<String> = self
            .params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();
        params.push(format!("page={page}"));

        format!("{}?{}", self.path, params.join("&"))
    }
}

#[derive(Serialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    pub fn from_rows(
        rows: Vec<T>,
        total_rows: i64,
        request: &PageRequest,
        link: &PageLink,
    ) -> Result<Self, ApiError> {
        if rows.is_empty() {
            if request.page > 1 {
                return Err(ApiError::NotFound(String::from("Invalid page.")));
            }
            return Ok(Self::no_rows());
        }

        let next = request
            .offset()
            .checked_add(request.limit)
            .is_some_and(|end| end < total_rows)
            .then(|| link.to_page(request.page + 1));
        let previous = (request.page > 1).then(|| link.to_page(request.page - 1));

        Ok(Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        })
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        }
    }
}

pub fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_without_parameters() {
        let paginator = Paginator::new(PaginationConfig::default());
        let request = paginator.request(&[]).unwrap();

        assert_eq!(request, PageRequest { page: 1, limit: DEFAULT_PAGE_SIZE });
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn limit_is_capped_at_the_configured_maximum() {
        let paginator = Paginator::new(PaginationConfig {
            page_size: 5,
            max_page_size: 20,
        });

        let request = paginator.request(&query(&[("limit", "500")])).unwrap();
        assert_eq!(request.limit, 20);

        let request = paginator.request(&query(&[("limit", "abc")])).unwrap();
        assert_eq!(request.limit, 5);
    }

    #[test]
    fn invalid_page_is_rejected() {
        let paginator = Paginator::new(PaginationConfig::default());

        assert!(paginator.request(&query(&[("page", "0")])).is_err());
        assert!(paginator.request(&query(&[("page", "last")])).is_err());
    }

    #[test]
    fn pages_beyond_the_addressable_range_are_rejected() {
        let paginator = Paginator::new(PaginationConfig::default());

        let error = paginator
            .request(&query(&[("page", "9223372036854775807")]))
            .unwrap_err();
        assert_eq!(error.to_string(), "Invalid page.");

        let request = PageRequest {
            page: i64::MAX,
            limit: 100,
        };
        assert_eq!(request.offset(), i64::MAX);
    }

    #[test]
    fn links_point_at_neighbouring_pages() {
        let params = query(&[("limit", "2"), ("page", "2"), ("tags", "lunch")]);
        let link = PageLink::new("/api/recipes/", &params);
        let request = PageRequest { page: 2, limit: 2 };

        let page = PageContext::from_rows(vec![3, 4], 5, &request, &link).unwrap();

        assert_eq!(page.count, 5);
        assert_eq!(
            page.next.as_deref(),
            Some("/api/recipes/?limit=2&tags=lunch&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("/api/recipes/?limit=2&tags=lunch&page=1")
        );
    }

    #[test]
    fn last_page_has_no_next_link() {
        let link = PageLink::new("/api/users/", &[]);
        let request = PageRequest { page: 3, limit: 2 };

        let page = PageContext::from_rows(vec![5], 5, &request, &link).unwrap();
        assert!(page.next.is_none());
    }

    #[test]
    fn empty_pages_past_the_first_are_not_found() {
        let link = PageLink::new("/api/users/", &[]);
        let request = PageRequest { page: 4, limit: 2 };

        assert!(PageContext::<i32>::from_rows(vec![], 0, &request, &link).is_err());
    }
}
