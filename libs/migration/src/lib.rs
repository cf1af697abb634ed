pub use sea_orm_migration::prelude::*;

mod m20250528_000001_create_users;
mod m20250528_000002_create_user_field_definitions;
mod m20250528_000003_create_user_field_values;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250528_000001_create_users::Migration),
            Box::new(m20250528_000002_create_user_field_definitions::Migration),
            Box::new(m20250528_000003_create_user_field_values::Migration),
        ]
    }
}
