//! Entities used by the unit tests.

pub mod post {
    use chrono::{DateTime, Utc};
    use common::AuditUser;
    use sea_orm::entity::prelude::*;
    use sea_orm::Set;

    use crate::entity::{Audited, IncludePath, ManagedEntity, SoftDeletable};

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "posts")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        pub body: String,
        pub created_at: Option<DateTimeUtc>,
        pub created_by: Option<String>,
        pub updated_at: Option<DateTimeUtc>,
        pub updated_by: Option<String>,
        pub deleted_at: Option<DateTimeUtc>,
        pub deleted_by: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::comment::Entity")]
        Comment,
    }

    impl Related<super::comment::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Comment.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl ManagedEntity for Entity {
        fn deleted_at_column() -> Option<Column> {
            Some(Column::DeletedAt)
        }

        fn navigation(path: &IncludePath) -> Option<Vec<RelationDef>> {
            match path.to_string().as_str() {
                "comments" => Some(vec![Relation::Comment.def()]),
                "comments.author" => Some(vec![
                    Relation::Comment.def(),
                    super::comment::Relation::Author.def(),
                ]),
                _ => None,
            }
        }
    }

    impl Audited for ActiveModel {
        fn stamp_created(&mut self, at: DateTime<Utc>, by: &AuditUser) {
            self.created_at = Set(Some(at));
            self.created_by = Set(Some(by.to_string()));
        }

        fn stamp_updated(&mut self, at: DateTime<Utc>, by: Option<&AuditUser>) {
            self.updated_at = Set(Some(at));
            if let Some(by) = by {
                self.updated_by = Set(Some(by.to_string()));
            }
        }
    }

    impl SoftDeletable for ActiveModel {
        fn stamp_deleted(&mut self, at: DateTime<Utc>, by: Option<&AuditUser>) {
            self.deleted_at = Set(Some(at));
            self.deleted_by = Set(by.map(ToString::to_string));
        }

        fn stamp_restored(&mut self, at: DateTime<Utc>, by: Option<&AuditUser>) {
            self.deleted_at = Set(None);
            self.deleted_by = Set(None);
            self.stamp_updated(at, by);
        }
    }

    pub fn model(id: i32, title: &str) -> Model {
        Model {
            id,
            title: title.to_string(),
            body: String::new(),
            created_at: None,
            created_by: None,
            updated_at: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        }
    }
}

pub mod comment {
    use chrono::{DateTime, Utc};
    use common::AuditUser;
    use sea_orm::entity::prelude::*;

    use crate::entity::{Audited, ManagedEntity, SoftDeletable};

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "comments")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub post_id: i32,
        pub author_id: i32,
        pub text: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::post::Entity",
            from = "Column::PostId",
            to = "super::post::Column::Id"
        )]
        Post,
        #[sea_orm(
            belongs_to = "super::author::Entity",
            from = "Column::AuthorId",
            to = "super::author::Column::Id"
        )]
        Author,
    }

    impl Related<super::post::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Post.def()
        }
    }

    impl Related<super::author::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Author.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl ManagedEntity for Entity {}

    impl Audited for ActiveModel {}

    // No deleted_at column, so the repository rejects soft delete.
    impl SoftDeletable for ActiveModel {
        fn stamp_deleted(&mut self, _at: DateTime<Utc>, _by: Option<&AuditUser>) {}

        fn stamp_restored(&mut self, _at: DateTime<Utc>, _by: Option<&AuditUser>) {}
    }
}

pub mod author {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "authors")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
