//! Caller identity as forwarded by the authenticating gateway.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::domain::access::Principal;
use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const STAFF_HEADER: &str = "X-User-Staff";

fn principal_from_request(req: &HttpRequest) -> Result<Principal, AppError> {
    let headers = req.headers();
    let Some(raw_id) = headers.get(USER_ID_HEADER) else {
        return Ok(Principal::anonymous());
    };

    let user_id = raw_id
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("Malformed {USER_ID_HEADER} header")))?;

    let is_staff = headers
        .get(STAFF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
        .unwrap_or(false);

    Ok(if is_staff {
        Principal::staff(user_id)
    } else {
        Principal::user(user_id)
    })
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(principal_from_request(req))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn missing_header_is_anonymous() {
        let req = TestRequest::default().to_http_request();
        let principal = principal_from_request(&req).unwrap();
        assert!(!principal.is_authenticated());
    }

    #[test]
    fn staff_flag_accepts_true_and_one() {
        for flag in ["true", "1", "TRUE"] {
            let req = TestRequest::default()
                .insert_header((USER_ID_HEADER, "5"))
                .insert_header((STAFF_HEADER, flag))
                .to_http_request();
            assert_eq!(principal_from_request(&req).unwrap(), Principal::staff(5));
        }
    }

    #[test]
    fn other_staff_values_mean_customer() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "5"))
            .insert_header((STAFF_HEADER, "yes"))
            .to_http_request();
        assert_eq!(principal_from_request(&req).unwrap(), Principal::user(5));
    }

    #[test]
    fn malformed_user_id_is_rejected() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "abc"))
            .to_http_request();
        assert!(matches!(
            principal_from_request(&req),
            Err(AppError::Unauthorized(_))
        ));
    }
}
