//! Database schema for Peerpool

pub const MIGRATIONS: &str = r#"
PRAGMA foreign_keys = ON;

-- People
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    full_name TEXT,
    avatar_url TEXT,
    created_at INTEGER NOT NULL
);

-- Self-declared availability windows (unix seconds)
CREATE TABLE IF NOT EXISTS availability_blocks (
    id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
    user_id TEXT NOT NULL,
    start_time INTEGER NOT NULL,
    end_time INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'available' CHECK (status IN ('available', 'busy', 'maybe')),
    created_at INTEGER NOT NULL,
    CHECK (start_time < end_time)
);

-- Hangouts
CREATE TABLE IF NOT EXISTS hangouts (
    id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
    title TEXT NOT NULL,
    description TEXT,
    creator_id TEXT NOT NULL,
    start_time INTEGER,
    end_time INTEGER,
    status TEXT NOT NULL DEFAULT 'planning' CHECK (status IN ('planning', 'confirmed', 'cancelled', 'completed')),
    is_public INTEGER NOT NULL DEFAULT 0,
    location TEXT,
    vibe TEXT CHECK (vibe IS NULL OR vibe IN ('chill', 'active', 'social', 'quiet', 'adventure')),
    max_people INTEGER NOT NULL DEFAULT 4,
    created_at INTEGER NOT NULL
);

-- One row per (hangout, user); upserts keep joins idempotent
CREATE TABLE IF NOT EXISTS hangout_participants (
    hangout_id TEXT NOT NULL REFERENCES hangouts(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'invited' CHECK (status IN ('invited', 'accepted', 'declined', 'maybe')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (hangout_id, user_id)
);

-- Friendships (directional rows, read symmetrically)
CREATE TABLE IF NOT EXISTS friendships (
    user_id TEXT NOT NULL,
    friend_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accepted', 'blocked')),
    created_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, friend_id)
);

CREATE INDEX IF NOT EXISTS idx_availability_user ON availability_blocks(user_id);
CREATE INDEX IF NOT EXISTS idx_availability_window ON availability_blocks(start_time, end_time);
CREATE INDEX IF NOT EXISTS idx_hangouts_creator ON hangouts(creator_id);
CREATE INDEX IF NOT EXISTS idx_hangouts_public_start ON hangouts(is_public, start_time);
CREATE INDEX IF NOT EXISTS idx_participants_user ON hangout_participants(user_id);
CREATE INDEX IF NOT EXISTS idx_friendships_friend ON friendships(friend_id);
"#;
