//! Diesel schema for thread persistence.

diesel::table! {
    /// Conversation threads, unique per (tenant, workflow type, participant).
    threads (id) {
        /// Thread identifier.
        id -> Uuid,
        /// Owning tenant.
        #[max_length = 255]
        tenant_id -> Varchar,
        /// Composite `AgentName:WorkflowName` type.
        #[max_length = 511]
        workflow_type -> Varchar,
        /// Participant identifier.
        #[max_length = 255]
        participant_id -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
