use axum::{
    Json,
    http::{HeaderValue, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::middleware::session::{Notices, clear_notice_cookie};

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    /// Count of an unpaginated list.
    pub fn total(total: usize) -> Self {
        Self {
            total: Some(i64::try_from(total).unwrap_or(i64::MAX)),
            ..Self::empty()
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
    /// Flash notices, each shown in exactly one response.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
            notices: Vec::new(),
        }
    }
}

/// A rendered page: the response body plus the notices it consumes.
///
/// Pending notices are moved into the body and the notice cookie is cleared,
/// so a notice is displayed once.
#[derive(Debug)]
pub struct View<T> {
    body: ApiResponse<T>,
    notices: Notices,
}

impl<T: Serialize> View<T> {
    pub fn new(body: ApiResponse<T>, notices: Notices) -> Self {
        Self { body, notices }
    }
}

impl<T: Serialize> IntoResponse for View<T> {
    fn into_response(self) -> Response {
        let View { mut body, notices } = self;
        if !notices.cookie_present() {
            return Json(body).into_response();
        }
        body.notices = notices.into_messages();
        (
            AppendHeaders([(SET_COOKIE, clear_notice_cookie())]),
            Json(body),
        )
            .into_response()
    }
}

/// `303 See Other` that also sets or clears cookies.
#[derive(Debug)]
pub struct SeeOther {
    location: String,
    cookies: Vec<HeaderValue>,
}

impl SeeOther {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: HeaderValue) -> Self {
        self.cookies.push(cookie);
        self
    }
}

impl IntoResponse for SeeOther {
    fn into_response(self) -> Response {
        let headers: Vec<_> = self
            .cookies
            .into_iter()
            .map(|cookie| (SET_COOKIE, cookie))
            .collect();
        (AppendHeaders(headers), Redirect::to(&self.location)).into_response()
    }
}
