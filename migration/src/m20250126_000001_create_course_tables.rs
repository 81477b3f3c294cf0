use sea_orm_migration::prelude::*;

use crate::m20250123_000001_create_tables::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 自增主键列
fn id_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ==================== 课程分类 ====================
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(id_column(Categories::Id))
                    .col(
                        ColumnDef::new(Categories::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Categories::Description).text().null())
                    .col(ColumnDef::new(Categories::ParentId).big_integer().null())
                    .col(ColumnDef::new(Categories::ColorCode).string_len(7).null())
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Categories::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Categories::Table, Categories::ParentId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 课程 ====================
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(id_column(Courses::Id))
                    .col(ColumnDef::new(Courses::Title).string().not_null())
                    .col(ColumnDef::new(Courses::Description).text().null())
                    .col(ColumnDef::new(Courses::CategoryId).big_integer().null())
                    .col(ColumnDef::new(Courses::CreatorId).big_integer().not_null())
                    .col(ColumnDef::new(Courses::Status).string().not_null())
                    .col(ColumnDef::new(Courses::DifficultyLevel).string().not_null())
                    .col(ColumnDef::new(Courses::EstimatedDuration).integer().null())
                    .col(
                        ColumnDef::new(Courses::IsMandatory)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // JSON 数组
                    .col(ColumnDef::new(Courses::Tags).text().not_null())
                    .col(ColumnDef::new(Courses::Prerequisites).text().not_null())
                    .col(ColumnDef::new(Courses::ThumbnailUrl).string().null())
                    .col(ColumnDef::new(Courses::PublishedAt).big_integer().null())
                    .col(ColumnDef::new(Courses::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Courses::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Courses::DeletedAt).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Courses::Table, Courses::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Courses::Table, Courses::CreatorId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 课程模块 ====================
        manager
            .create_table(
                Table::create()
                    .table(Modules::Table)
                    .if_not_exists()
                    .col(id_column(Modules::Id))
                    .col(ColumnDef::new(Modules::CourseId).big_integer().not_null())
                    .col(ColumnDef::new(Modules::Title).string().not_null())
                    .col(ColumnDef::new(Modules::Description).text().null())
                    .col(ColumnDef::new(Modules::ContentType).string().not_null())
                    .col(ColumnDef::new(Modules::ContentUrl).string().null())
                    .col(ColumnDef::new(Modules::ContentData).text().null())
                    .col(ColumnDef::new(Modules::OrderIndex).integer().not_null())
                    .col(
                        ColumnDef::new(Modules::IsMandatory)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Modules::EstimatedDuration).integer().null())
                    .col(ColumnDef::new(Modules::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Modules::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Modules::Table, Modules::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 文档 ====================
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(id_column(Documents::Id))
                    .col(ColumnDef::new(Documents::ModuleId).big_integer().not_null())
                    .col(ColumnDef::new(Documents::Title).string().not_null())
                    .col(ColumnDef::new(Documents::FilePath).string().not_null())
                    .col(ColumnDef::new(Documents::FileType).string().not_null())
                    .col(ColumnDef::new(Documents::FileSize).big_integer().not_null())
                    .col(
                        ColumnDef::new(Documents::DownloadCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Documents::IsDownloadable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Documents::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Documents::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Documents::Table, Documents::ModuleId)
                            .to(Modules::Table, Modules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 视频 ====================
        manager
            .create_table(
                Table::create()
                    .table(Videos::Table)
                    .if_not_exists()
                    .col(id_column(Videos::Id))
                    .col(ColumnDef::new(Videos::ModuleId).big_integer().not_null())
                    .col(ColumnDef::new(Videos::Title).string().not_null())
                    .col(ColumnDef::new(Videos::VideoUrl).string().not_null())
                    .col(ColumnDef::new(Videos::Duration).integer().null())
                    .col(ColumnDef::new(Videos::ThumbnailUrl).string().null())
                    .col(ColumnDef::new(Videos::VideoType).string().not_null())
                    .col(ColumnDef::new(Videos::QualityOptions).text().not_null())
                    .col(ColumnDef::new(Videos::SubtitlesUrl).string().null())
                    .col(ColumnDef::new(Videos::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Videos::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Videos::Table, Videos::ModuleId)
                            .to(Modules::Table, Modules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 测验 ====================
        manager
            .create_table(
                Table::create()
                    .table(Quizzes::Table)
                    .if_not_exists()
                    .col(id_column(Quizzes::Id))
                    .col(ColumnDef::new(Quizzes::ModuleId).big_integer().not_null())
                    .col(ColumnDef::new(Quizzes::Title).string().not_null())
                    .col(ColumnDef::new(Quizzes::Description).text().null())
                    .col(ColumnDef::new(Quizzes::TimeLimit).integer().null())
                    .col(ColumnDef::new(Quizzes::MaxAttempts).integer().not_null())
                    .col(ColumnDef::new(Quizzes::PassingScore).double().not_null())
                    .col(
                        ColumnDef::new(Quizzes::RandomizeQuestions)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Quizzes::ShowResultsImmediately)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Quizzes::AllowReview)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Quizzes::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Quizzes::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Quizzes::Table, Quizzes::ModuleId)
                            .to(Modules::Table, Modules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(id_column(Questions::Id))
                    .col(ColumnDef::new(Questions::QuizId).big_integer().not_null())
                    .col(ColumnDef::new(Questions::QuestionText).text().not_null())
                    .col(ColumnDef::new(Questions::QuestionType).string().not_null())
                    .col(ColumnDef::new(Questions::Points).double().not_null())
                    .col(ColumnDef::new(Questions::OrderIndex).integer().not_null())
                    .col(ColumnDef::new(Questions::Explanation).text().null())
                    .col(ColumnDef::new(Questions::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Questions::Table, Questions::QuizId)
                            .to(Quizzes::Table, Quizzes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuestionOptions::Table)
                    .if_not_exists()
                    .col(id_column(QuestionOptions::Id))
                    .col(
                        ColumnDef::new(QuestionOptions::QuestionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuestionOptions::OptionText).text().not_null())
                    .col(
                        ColumnDef::new(QuestionOptions::IsCorrect)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(QuestionOptions::OrderIndex)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(QuestionOptions::Table, QuestionOptions::QuestionId)
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuizAttempts::Table)
                    .if_not_exists()
                    .col(id_column(QuizAttempts::Id))
                    .col(ColumnDef::new(QuizAttempts::QuizId).big_integer().not_null())
                    .col(ColumnDef::new(QuizAttempts::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(QuizAttempts::AttemptNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuizAttempts::Score).double().null())
                    .col(
                        ColumnDef::new(QuizAttempts::TotalPoints)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::EarnedPoints)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::IsPassed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::StartedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuizAttempts::CompletedAt).big_integer().null())
                    .col(
                        ColumnDef::new(QuizAttempts::TimeSpent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(QuizAttempts::Table, QuizAttempts::QuizId)
                            .to(Quizzes::Table, Quizzes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(QuizAttempts::Table, QuizAttempts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuizResponses::Table)
                    .if_not_exists()
                    .col(id_column(QuizResponses::Id))
                    .col(
                        ColumnDef::new(QuizResponses::AttemptId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuizResponses::QuestionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuizResponses::QuestionOptionId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(QuizResponses::TextResponse).text().null())
                    .col(ColumnDef::new(QuizResponses::IsCorrect).boolean().null())
                    .col(
                        ColumnDef::new(QuizResponses::PointsEarned)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(QuizResponses::Table, QuizResponses::AttemptId)
                            .to(QuizAttempts::Table, QuizAttempts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(QuizResponses::Table, QuizResponses::QuestionId)
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(QuizResponses::Table, QuizResponses::QuestionOptionId)
                            .to(QuestionOptions::Table, QuestionOptions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 选课与进度 ====================
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(id_column(Enrollments::Id))
                    .col(ColumnDef::new(Enrollments::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Enrollments::CourseId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Enrollments::EnrolledAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enrollments::StartedAt).big_integer().null())
                    .col(ColumnDef::new(Enrollments::CompletedAt).big_integer().null())
                    .col(
                        ColumnDef::new(Enrollments::ProgressPercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Enrollments::Status).string().not_null())
                    .col(ColumnDef::new(Enrollments::DueDate).big_integer().null())
                    .col(ColumnDef::new(Enrollments::AssignedBy).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Enrollments::Table, Enrollments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Enrollments::Table, Enrollments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Enrollments::Table, Enrollments::AssignedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ModuleProgress::Table)
                    .if_not_exists()
                    .col(id_column(ModuleProgress::Id))
                    .col(
                        ColumnDef::new(ModuleProgress::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ModuleProgress::ModuleId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ModuleProgress::CompletedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ModuleProgress::Table, ModuleProgress::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ModuleProgress::Table, ModuleProgress::ModuleId)
                            .to(Modules::Table, Modules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 索引 ====================
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_courses_status")
                    .table(Courses::Table)
                    .col(Courses::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_courses_category_id")
                    .table(Courses::Table)
                    .col(Courses::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_modules_course_order")
                    .table(Modules::Table)
                    .col(Modules::CourseId)
                    .col(Modules::OrderIndex)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_quiz_attempts_quiz_user")
                    .table(QuizAttempts::Table)
                    .col(QuizAttempts::QuizId)
                    .col(QuizAttempts::UserId)
                    .to_owned(),
            )
            .await?;

        // 同一用户对同一课程只能有一条选课记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_enrollments_user_course")
                    .table(Enrollments::Table)
                    .col(Enrollments::UserId)
                    .col(Enrollments::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_module_progress_user_module")
                    .table(ModuleProgress::Table)
                    .col(ModuleProgress::UserId)
                    .col(ModuleProgress::ModuleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        let tables = [
            ModuleProgress::Table.into_iden(),
            Enrollments::Table.into_iden(),
            QuizResponses::Table.into_iden(),
            QuizAttempts::Table.into_iden(),
            QuestionOptions::Table.into_iden(),
            Questions::Table.into_iden(),
            Quizzes::Table.into_iden(),
            Videos::Table.into_iden(),
            Documents::Table.into_iden(),
            Modules::Table.into_iden(),
            Courses::Table.into_iden(),
            Categories::Table.into_iden(),
        ];
        for table in tables {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Categories {
    #[sea_orm(iden = "categories")]
    Table,
    Id,
    Name,
    Description,
    ParentId,
    ColorCode,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Courses {
    #[sea_orm(iden = "courses")]
    Table,
    Id,
    Title,
    Description,
    CategoryId,
    CreatorId,
    Status,
    DifficultyLevel,
    EstimatedDuration,
    IsMandatory,
    Tags,
    Prerequisites,
    ThumbnailUrl,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Modules {
    #[sea_orm(iden = "modules")]
    Table,
    Id,
    CourseId,
    Title,
    Description,
    ContentType,
    ContentUrl,
    ContentData,
    OrderIndex,
    IsMandatory,
    EstimatedDuration,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Documents {
    #[sea_orm(iden = "documents")]
    Table,
    Id,
    ModuleId,
    Title,
    FilePath,
    FileType,
    FileSize,
    DownloadCount,
    IsDownloadable,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Videos {
    #[sea_orm(iden = "videos")]
    Table,
    Id,
    ModuleId,
    Title,
    VideoUrl,
    Duration,
    ThumbnailUrl,
    VideoType,
    QualityOptions,
    SubtitlesUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Quizzes {
    #[sea_orm(iden = "quizzes")]
    Table,
    Id,
    ModuleId,
    Title,
    Description,
    TimeLimit,
    MaxAttempts,
    PassingScore,
    RandomizeQuestions,
    ShowResultsImmediately,
    AllowReview,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Questions {
    #[sea_orm(iden = "questions")]
    Table,
    Id,
    QuizId,
    QuestionText,
    QuestionType,
    Points,
    OrderIndex,
    Explanation,
    CreatedAt,
}

#[derive(DeriveIden)]
enum QuestionOptions {
    #[sea_orm(iden = "question_options")]
    Table,
    Id,
    QuestionId,
    OptionText,
    IsCorrect,
    OrderIndex,
}

#[derive(DeriveIden)]
enum QuizAttempts {
    #[sea_orm(iden = "quiz_attempts")]
    Table,
    Id,
    QuizId,
    UserId,
    AttemptNumber,
    Score,
    TotalPoints,
    EarnedPoints,
    IsPassed,
    StartedAt,
    CompletedAt,
    TimeSpent,
}

#[derive(DeriveIden)]
enum QuizResponses {
    #[sea_orm(iden = "quiz_responses")]
    Table,
    Id,
    AttemptId,
    QuestionId,
    QuestionOptionId,
    TextResponse,
    IsCorrect,
    PointsEarned,
}

#[derive(DeriveIden)]
enum Enrollments {
    #[sea_orm(iden = "enrollments")]
    Table,
    Id,
    UserId,
    CourseId,
    EnrolledAt,
    StartedAt,
    CompletedAt,
    ProgressPercentage,
    Status,
    DueDate,
    AssignedBy,
}

#[derive(DeriveIden)]
enum ModuleProgress {
    #[sea_orm(iden = "module_progress")]
    Table,
    Id,
    UserId,
    ModuleId,
    CompletedAt,
}
