//! Diesel schema for message persistence.

diesel::table! {
    /// One row per (thread, scope) bucket, holding the sequence counter
    /// and the hint register.
    scope_buckets (id) {
        /// Deterministic bucket identifier.
        id -> Uuid,
        /// Owning thread.
        thread_id -> Uuid,
        /// Scope label; `NULL` for the null scope.
        scope -> Nullable<Text>,
        /// Highest sequence number assigned in the bucket.
        last_sequence -> Int8,
        /// Hint register.
        last_hint -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only message ledger.
    messages (id) {
        /// Message identifier.
        id -> Uuid,
        /// Bucket the message was placed in.
        scope_bucket_id -> Uuid,
        /// Owning thread.
        thread_id -> Uuid,
        /// Scope label; `NULL` for the null scope.
        scope -> Nullable<Text>,
        /// Thread participant.
        #[max_length = 255]
        participant_id -> Varchar,
        /// Workflow type of the thread.
        #[max_length = 511]
        workflow_type -> Varchar,
        /// Incoming or outgoing.
        #[max_length = 16]
        direction -> Varchar,
        /// Payload discriminant.
        #[max_length = 16]
        message_type -> Varchar,
        /// Producer of the message as JSONB.
        origin -> Jsonb,
        /// Tagged payload as JSONB.
        payload -> Jsonb,
        /// Metadata map as JSONB.
        metadata -> Jsonb,
        /// Optional hint.
        hint -> Nullable<Text>,
        /// Optional correlation identifier.
        #[max_length = 255]
        request_id -> Nullable<Varchar>,
        /// SHA-256 fingerprint of the authorization token.
        #[max_length = 64]
        authorization_fingerprint -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Position within the bucket.
        sequence_number -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(scope_buckets, messages);
