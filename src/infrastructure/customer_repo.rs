use std::collections::HashMap;

use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::customer::{Address, CustomerUpdate, CustomerView};
use crate::domain::errors::DomainError;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::CustomerRepository;
use crate::schema::{addresses, customers};

use super::models::{AddressRow, CustomerChanges, CustomerRow, NewCustomerRow};

fn customer_view(row: CustomerRow, address: Option<AddressRow>) -> Result<CustomerView, DomainError> {
    Ok(CustomerView {
        id: row.id,
        user_id: row.user_id,
        phone: row.phone,
        birth_date: row.birth_date,
        membership: row.membership.parse()?,
        address: address.map(|a| Address {
            street: a.street,
            city: a.city,
        }),
    })
}

fn load_view(conn: &mut PgConnection, row: CustomerRow) -> Result<CustomerView, DomainError> {
    let address = addresses::table
        .find(row.id)
        .select(AddressRow::as_select())
        .first(conn)
        .optional()?;
    customer_view(row, address)
}

/// Returns the user's customer row, inserting a default one first if needed.
/// Runs on the caller's connection so it can join an outer transaction.
pub(crate) fn get_or_create_customer(
    conn: &mut PgConnection,
    user_id: i64,
) -> QueryResult<CustomerRow> {
    diesel::insert_into(customers::table)
        .values(&NewCustomerRow { user_id })
        .on_conflict(customers::user_id)
        .do_nothing()
        .execute(conn)?;

    customers::table
        .filter(customers::user_id.eq(user_id))
        .select(CustomerRow::as_select())
        .first(conn)
}

pub struct DieselCustomerRepository {
    pool: DbPool,
}

impl DieselCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CustomerRepository for DieselCustomerRepository {
    fn find_by_user(&self, user_id: i64) -> Result<Option<CustomerView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = customers::table
            .filter(customers::user_id.eq(user_id))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(|r| load_view(&mut conn, r)).transpose()
    }

    fn get_or_create(&self, user_id: i64) -> Result<CustomerView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = get_or_create_customer(conn, user_id)?;
            load_view(conn, row)
        })
    }

    fn update(&self, user_id: i64, update: CustomerUpdate) -> Result<CustomerView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let existing = get_or_create_customer(conn, user_id)?;
            let row = diesel::update(customers::table.find(existing.id))
                .set(&CustomerChanges {
                    phone: update.phone,
                    birth_date: update.birth_date,
                    membership: update.membership.as_str().to_string(),
                })
                .returning(CustomerRow::as_returning())
                .get_result(conn)?;

            match update.address {
                Some(address) => {
                    let address = AddressRow {
                        customer_id: row.id,
                        street: address.street,
                        city: address.city,
                    };
                    diesel::insert_into(addresses::table)
                        .values(&address)
                        .on_conflict(addresses::customer_id)
                        .do_update()
                        .set((
                            addresses::street.eq(&address.street),
                            addresses::city.eq(&address.city),
                        ))
                        .execute(conn)?;
                }
                None => {
                    diesel::delete(addresses::table.find(row.id)).execute(conn)?;
                }
            }

            load_view(conn, row)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<CustomerView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = customers::table
            .find(id)
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(|r| load_view(&mut conn, r)).transpose()
    }

    fn list(&self, page: PageRequest) -> Result<Page<CustomerView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = customers::table.count().get_result(conn)?;
            let rows: Vec<CustomerRow> = customers::table
                .select(CustomerRow::as_select())
                .order(customers::id.asc())
                .limit(page.limit)
                .offset(page.offset())
                .load(conn)?;

            let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
            let mut by_customer: HashMap<i64, AddressRow> = addresses::table
                .filter(addresses::customer_id.eq_any(ids))
                .select(AddressRow::as_select())
                .load(conn)?
                .into_iter()
                .map(|a| (a.customer_id, a))
                .collect();

            let items = rows
                .into_iter()
                .map(|r| {
                    let address = by_customer.remove(&r.id);
                    customer_view(r, address)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Page { items, total })
        })
    }
}
