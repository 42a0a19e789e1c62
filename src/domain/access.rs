//! Who may do what.
//!
//! The gateway in front of the service authenticates users; this module only
//! decides, given the resulting [`Principal`], whether an operation is allowed.

use super::errors::DomainError;

/// The caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Principal {
    pub user_id: Option<i64>,
    pub is_staff: bool,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            is_staff: false,
        }
    }

    pub fn staff(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            is_staff: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Returns the user id, or `AuthenticationRequired` for anonymous callers.
    pub fn require_user(&self) -> Result<i64, DomainError> {
        self.user_id.ok_or(DomainError::AuthenticationRequired)
    }

    /// Staff-only gate: anonymous callers get 401, other users 403.
    pub fn require_staff(&self) -> Result<(), DomainError> {
        self.require_user()?;
        if self.is_staff {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied)
        }
    }
}

/// Which orders a principal is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Customer(i64),
    Nothing,
}

impl OrderScope {
    /// Staff see every order; customers only those placed under their
    /// profile; users without a profile see none.
    pub fn for_principal(
        principal: &Principal,
        customer_id: Option<i64>,
    ) -> Result<Self, DomainError> {
        principal.require_user()?;
        if principal.is_staff {
            return Ok(OrderScope::All);
        }
        Ok(match customer_id {
            Some(id) => OrderScope::Customer(id),
            None => OrderScope::Nothing,
        })
    }

    pub fn permits(&self, order_customer_id: i64) -> bool {
        match self {
            OrderScope::All => true,
            OrderScope::Customer(id) => *id == order_customer_id,
            OrderScope::Nothing => false,
        }
    }
}
