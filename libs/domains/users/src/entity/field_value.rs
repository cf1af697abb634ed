use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::fields::models::{FieldValue, NewFieldValue};

/// Sea-ORM Entity for the user_field_values table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_field_values")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Uuid,
    pub field_definition_id: i32,
    #[sea_orm(column_type = "Text")]
    pub value: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::field_definition::Entity",
        from = "Column::FieldDefinitionId",
        to = "super::field_definition::Column::Id",
        on_delete = "Cascade"
    )]
    FieldDefinition,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::field_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FieldDefinition.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for FieldValue {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            field_definition_id: model.field_definition_id,
            value: model.value,
            created_at: model.created_at.into(),
        }
    }
}

impl ActiveModel {
    pub fn for_user(user_id: Uuid, input: NewFieldValue) -> Self {
        ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            field_definition_id: Set(input.field_definition_id),
            value: Set(input.value),
            created_at: Set(chrono::Utc::now().into()),
        }
    }
}
