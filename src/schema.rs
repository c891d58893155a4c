// Diesel table definitions for the harvest store.

diesel::table! {
    posts (id) {
        id -> Text,
        title -> Text,
        author -> Text,
        author_id -> Text,
        kind -> Text,
        feed -> Text,
        url -> Text,
        score -> BigInt,
        content -> Text,
        images -> Text,
        video -> Nullable<Text>,
        harvested_at -> Text,
    }
}

diesel::table! {
    comments (id) {
        id -> Text,
        post_id -> Text,
        author -> Text,
        parent_id -> Nullable<Text>,
        content_type -> Text,
        content -> Text,
    }
}

diesel::joinable!(comments -> posts (post_id));

diesel::allow_tables_to_appear_in_same_query!(posts, comments);
