use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::fields::models::{CreateFieldDefinition, FieldDefinition};
use crate::fields::types::FieldType;

/// Sea-ORM Entity for the user_field_definitions table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_field_definitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::field_value::Entity")]
    FieldValues,
}

impl Related<super::field_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FieldValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for FieldDefinition {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            field_type: model.field_type,
            required: model.required,
            description: model.description,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<CreateFieldDefinition> for ActiveModel {
    fn from(input: CreateFieldDefinition) -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            id: NotSet,
            name: Set(input.name),
            field_type: Set(input.field_type),
            required: Set(input.required),
            description: Set(input.description),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}
