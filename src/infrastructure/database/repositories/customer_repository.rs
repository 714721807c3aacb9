//! SeaORM implementation of CustomerRepository

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};

use super::db_err;
use crate::domain::customer::{ContactInfo, Customer, CustomerRepository, DocumentRef};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::customer;

pub struct SeaOrmCustomerRepository {
    db: DatabaseConnection,
}

impl SeaOrmCustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn customer_to_domain(m: customer::Model) -> Customer {
    Customer {
        id: m.id,
        document: DocumentRef {
            doc_type: m.document_type,
            number: m.document_number,
        },
        contact: ContactInfo {
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email,
            phone: m.phone,
        },
        created_at: m.created_at,
    }
}

#[async_trait]
impl CustomerRepository for SeaOrmCustomerRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>> {
        let model = customer::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(customer_to_domain))
    }
}
