//! Diesel schema for task persistence.

diesel::table! {
    /// Human-in-the-loop tasks.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Title shown to the human.
        #[max_length = 255]
        title -> Varchar,
        /// Description shown to the human.
        description -> Text,
        /// Addressed participant.
        #[max_length = 255]
        participant_id -> Varchar,
        /// Linked thread, if any.
        thread_id -> Nullable<Uuid>,
        /// Linked scope; `NULL` for the null scope.
        #[max_length = 255]
        scope -> Nullable<Varchar>,
        /// Draft work under review.
        draft -> Jsonb,
        /// Permissible action labels.
        allowed_actions -> Jsonb,
        /// Absolute deadline, if any.
        deadline -> Nullable<Timestamptz>,
        /// Whether the task outlives its parent workflow.
        survive_parent_close -> Bool,
        /// Lifecycle state.
        #[max_length = 50]
        state -> Varchar,
        /// Performed action of a completed task.
        #[max_length = 255]
        performed_action -> Nullable<Varchar>,
        /// Comment left with the action.
        comment -> Nullable<Text>,
        /// When the task left pending.
        completed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest transition timestamp.
        updated_at -> Timestamptz,
    }
}
