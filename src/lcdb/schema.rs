pub const REVIEWS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Reviews (
        slug             TEXT        PRIMARY KEY,
        title            TEXT        NOT NULL,
        problem_url      TEXT,

        added_at         INTEGER     NOT NULL,
        next_review      INTEGER     NOT NULL,
        interval         INTEGER     NOT NULL    CHECK (interval >= 1),
        repetitions      INTEGER     NOT NULL    CHECK (repetitions >= 0),
        ef               REAL        NOT NULL    CHECK (ef >= 1.3),
        last_reviewed    INTEGER,

        user_difficulty  TEXT,
        rated_at         INTEGER
    )";

pub const SETTINGS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Settings (
        key            TEXT        PRIMARY KEY,
        value          TEXT        NOT NULL
    )";
