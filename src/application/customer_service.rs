use std::sync::Arc;

use crate::domain::access::Principal;
use crate::domain::customer::{CustomerUpdate, CustomerView};
use crate::domain::errors::DomainError;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::CustomerRepository;

#[derive(Clone)]
pub struct CustomerService {
    repo: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(repo: Arc<dyn CustomerRepository>) -> Self {
        Self { repo }
    }

    /// The caller's own profile, created with defaults on first access.
    pub fn me(&self, principal: &Principal) -> Result<CustomerView, DomainError> {
        let user_id = principal.require_user()?;
        self.repo.get_or_create(user_id)
    }

    pub fn update_me(
        &self,
        principal: &Principal,
        update: CustomerUpdate,
    ) -> Result<CustomerView, DomainError> {
        let user_id = principal.require_user()?;
        update.validate()?;
        let customer = self.repo.update(user_id, update)?;
        log::info!("Updated customer profile {}", customer.id);
        Ok(customer)
    }

    pub fn list_customers(
        &self,
        principal: &Principal,
        page: PageRequest,
    ) -> Result<Page<CustomerView>, DomainError> {
        principal.require_staff()?;
        self.repo.list(page)
    }

    pub fn get_customer(&self, principal: &Principal, id: i64) -> Result<CustomerView, DomainError> {
        principal.require_staff()?;
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found(format!("Customer {id}")))
    }
}
