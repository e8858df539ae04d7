pub const DEFAULT_WORKSPACE_DIR: &str = ".claude";
pub const DEFAULT_ARCHIVE_DIR: &str = "Documents/claude-archives";
pub const DEFAULT_PROJECTS_DIR: &str = "Projects";
pub const DEFAULT_RETENTION_DAYS: u32 = 7;
pub const APP_DIR: &str = "reclaim";
pub const SETTINGS_FILE: &str = "settings.toml";
pub const ALLOWLIST_FILE: &str = "allowlist.txt";

pub const ARCHIVE_DIRS: &[&str] = &["projects", "transcripts"];
pub const DELETE_ONLY_DIRS: &[&str] = &[
    "plugins",
    "debug",
    "shell-snapshots",
    "file-history",
    "logs",
];
pub const TEMP_PATTERNS: &[&str] = &["paste-cache", "*.backup*", ".DS_Store"];

pub const MAX_SCAN_DEPTH: usize = 5;
pub const SUMMARY_ITEM_LIMIT: usize = 10;

pub const PROTECTION_MARKERS: &[&str] = &[".keep", "DO_NOT_DELETE"];

pub const SYSTEM_ROOTS: &[&str] = &[
    "/",
    "/bin",
    "/boot",
    "/dev",
    "/etc",
    "/lib",
    "/lib64",
    "/opt",
    "/proc",
    "/root",
    "/sbin",
    "/sys",
    "/usr",
    "/var",
    "/Applications",
    "/Library",
    "/System",
    "/Users",
    "/Volumes",
    "/private",
    "/home",
];

// Caches
pub const USER_CACHE: &str = ".cache";
pub const LIBRARY_CACHES: &str = "Library/Caches";
pub const NPM_CACHE: &str = ".npm";
pub const BUN_CACHE: &str = ".bun/install/cache";
pub const PNPM_STORE: &str = ".pnpm-store";
pub const GO_MOD_CACHE: &str = "go/pkg/mod";
pub const CARGO_REGISTRY: &str = ".cargo/registry";
pub const GRADLE_CACHE: &str = ".gradle/caches";

pub const KNOWN_TOOL_CACHES: &[&str] = &[
    NPM_CACHE,
    BUN_CACHE,
    PNPM_STORE,
    GO_MOD_CACHE,
    CARGO_REGISTRY,
    GRADLE_CACHE,
];

pub const SAFE_CACHE_NAMES: &[&str] = &[
    "pip",
    "npm",
    ".npm",
    "_cacache",
    "yarn",
    "pnpm",
    ".pnpm-store",
    "go-build",
    "mod",
    "registry",
    "caches",
    "cache",
    "node-gyp",
    "typescript",
    "puppeteer",
    "ms-playwright",
    "electron",
    "electron-builder",
    "pre-commit",
    "pypoetry",
    "uv",
    "deno",
    "bazel",
    "ccache",
    "sccache",
    "homebrew",
    "cocoapods",
    "composer",
    "mesa_shader_cache",
    "thumbnails",
    "fontconfig",
    "jedi",
    "black",
    "ruff",
    "mypy",
    "com.apple.python",
];

pub const DANGER_KEYWORDS: &[&str] = &[
    "auth",
    "token",
    "session",
    "credential",
    "secret",
    "password",
    "keychain",
    "keyring",
    "cookie",
];

pub const DATABASE_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3", "db-wal", "db-shm", "ldb"];

pub const REVIEW_SAMPLE_SIZE: usize = 5;
