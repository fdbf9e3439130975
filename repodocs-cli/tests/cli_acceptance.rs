use repodocs_core::types::NewRepo;
use repodocs_core::{Database, RepoRecord};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const TEST_USER: &str = "user_test";

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("repodocs/repodocs.db")
    }

    fn open_db(&self) -> Database {
        let db = Database::open(&self.db_path()).expect("failed to open db");
        db.migrate().expect("failed to migrate db");
        db
    }

    fn scratch_dir(&self, name: &str) -> PathBuf {
        let dir = self.home.join(name);
        fs::create_dir_all(&dir).expect("failed to create scratch dir");
        dir
    }
}

fn seed_repo(env: &CliTestEnv, owner: &str, github_id: i64, name: &str) -> RepoRecord {
    env.open_db()
        .save_repo(
            owner,
            &NewRepo {
                github_repo_id: github_id,
                name: name.to_string(),
                html_url: Some(format!("https://github.com/acme/{name}")),
                github_token: Some("ghp_seeded_secret".to_string()),
            },
        )
        .expect("failed to seed repo")
}

fn seed_documentation(env: &CliTestEnv, repo_id: i64, chunks: &[(i64, &str)]) -> i64 {
    let db = env.open_db();
    let doc_id = db
        .insert_documentation(repo_id, chrono::Utc::now())
        .expect("failed to seed documentation");
    for (index, content) in chunks {
        db.insert_chunk(doc_id, *index, content)
            .expect("failed to seed chunk");
    }
    doc_id
}

fn run_bin(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> Output {
    let bin_path = match bin_name {
        "repodocs" => PathBuf::from(assert_cmd::cargo::cargo_bin!("repodocs")),
        "repodocs-init" => PathBuf::from(assert_cmd::cargo::cargo_bin!("repodocs-init")),
        _ => panic!("unsupported binary in test harness: {bin_name}"),
    };

    let mut command = Command::new(bin_path);

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env("REPODOCS_USER", TEST_USER)
        .env_remove("REPODOCS_DB")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute {bin_name}: {e}"))
}

fn assert_success(bin_name: &str, args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "{bin_name} {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn init_creates_schema_and_is_idempotent() {
    let env = CliTestEnv::new();

    let first = run_bin(&env, "repodocs-init", &[]);
    assert_success("repodocs-init", &[], &first);
    assert!(
        String::from_utf8_lossy(&first.stdout).contains("Database ready"),
        "expected readiness confirmation"
    );
    assert!(env.db_path().exists(), "database file should exist");

    // Second run must succeed and leave existing data alone
    seed_repo(&env, TEST_USER, 1, "survivor");
    let second = run_bin(&env, "repodocs-init", &[]);
    assert_success("repodocs-init", &[], &second);
    assert!(String::from_utf8_lossy(&second.stdout).contains("Database ready"));

    let repos = env.open_db().list_repos(TEST_USER).expect("list failed");
    assert_eq!(repos.len(), 1, "re-running init must not drop data");
}

#[test]
fn list_shows_connected_repos_scoped_to_user() {
    let env = CliTestEnv::new();

    let empty = run_bin(&env, "repodocs", &["list"]);
    assert_success("repodocs", &["list"], &empty);
    assert!(String::from_utf8_lossy(&empty.stdout).contains("No repositories connected."));

    seed_repo(&env, TEST_USER, 10, "mine");
    seed_repo(&env, "someone_else", 11, "not-mine");

    let listed = run_bin(&env, "repodocs", &["list"]);
    assert_success("repodocs", &["list"], &listed);
    let stdout = String::from_utf8_lossy(&listed.stdout);
    assert!(stdout.contains("mine"));
    assert!(!stdout.contains("not-mine"));
}

#[test]
fn list_json_emits_repos_payload_without_tokens() {
    let env = CliTestEnv::new();
    let seeded = seed_repo(&env, TEST_USER, 42, "payload");

    let output = run_bin(&env, "repodocs", &["list", "--json"]);
    assert_success("repodocs", &["list", "--json"], &output);

    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let repos = payload["repos"].as_array().expect("repos array");
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0]["id"], seeded.id);
    assert_eq!(repos[0]["github_repo_id"], 42);

    // The stored token must never appear in output
    assert!(!String::from_utf8_lossy(&output.stdout).contains("ghp_seeded_secret"));
}

#[test]
fn remove_deletes_own_repo() {
    let env = CliTestEnv::new();
    let seeded = seed_repo(&env, TEST_USER, 10, "doomed");
    let id_arg = seeded.id.to_string();

    let output = run_bin(&env, "repodocs", &["remove", &id_arg, "--yes"]);
    assert_success("repodocs", &["remove", &id_arg, "--yes"], &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Removed repository"));

    assert!(env.open_db().list_repos(TEST_USER).unwrap().is_empty());
}

#[test]
fn remove_without_confirmation_aborts() {
    let env = CliTestEnv::new();
    let seeded = seed_repo(&env, TEST_USER, 10, "survivor");
    let id_arg = seeded.id.to_string();

    // stdin is closed, so the [y/N] prompt reads EOF and defaults to no
    let output = run_bin(&env, "repodocs", &["remove", &id_arg]);
    assert_success("repodocs", &["remove", &id_arg], &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Aborted."));

    assert_eq!(env.open_db().list_repos(TEST_USER).unwrap().len(), 1);
}

#[test]
fn remove_foreign_repo_reads_as_not_found() {
    let env = CliTestEnv::new();
    let foreign = seed_repo(&env, "someone_else", 10, "not-mine");
    let id_arg = foreign.id.to_string();

    let output = run_bin(&env, "repodocs", &["remove", &id_arg, "--yes"]);
    assert!(!output.status.success(), "foreign remove must fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("repository not found"));

    // Still there for its owner
    assert_eq!(env.open_db().list_repos("someone_else").unwrap().len(), 1);
}

#[test]
fn docs_renders_chunks_in_order() {
    let env = CliTestEnv::new();
    let repo = seed_repo(&env, TEST_USER, 10, "documented");
    // Seeded deliberately out of index order
    let doc_id = seed_documentation(
        &env,
        repo.id,
        &[(1, "<h2>Second</h2>"), (0, "<h2>First</h2>")],
    );
    let id_arg = doc_id.to_string();

    let output = run_bin(&env, "repodocs", &["docs", &id_arg]);
    assert_success("repodocs", &["docs", &id_arg], &output);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let first = stdout.find("<h2>First</h2>").expect("first chunk missing");
    let second = stdout.find("<h2>Second</h2>").expect("second chunk missing");
    assert!(first < second, "chunks must render by ascending index");
    assert_eq!(stdout.matches("chunk-separator").count(), 1);
    assert!(stdout.contains("documented Documentation"));
}

#[test]
fn docs_writes_page_to_file() {
    let env = CliTestEnv::new();
    let repo = seed_repo(&env, TEST_USER, 10, "documented");
    let doc_id = seed_documentation(&env, repo.id, &[(0, "<p>body</p>")]);

    let out_file = env.home.join("page.html");
    let id_arg = doc_id.to_string();
    let out_arg = out_file.to_string_lossy().into_owned();
    let args = ["docs", id_arg.as_str(), "--output", out_arg.as_str()];

    let output = run_bin(&env, "repodocs", &args);
    assert_success("repodocs", &args, &output);

    let page = fs::read_to_string(&out_file).expect("page file should exist");
    assert!(page.contains("<p>body</p>"));
}

#[test]
fn docs_empty_run_shows_empty_state() {
    let env = CliTestEnv::new();
    let repo = seed_repo(&env, TEST_USER, 10, "documented");
    let doc_id = seed_documentation(&env, repo.id, &[]);
    let id_arg = doc_id.to_string();

    let output = run_bin(&env, "repodocs", &["docs", &id_arg]);
    assert_success("repodocs", &["docs", &id_arg], &output);
    assert!(String::from_utf8_lossy(&output.stdout)
        .contains("No documentation content available."));
}

#[test]
fn docs_missing_foreign_and_malformed_ids_read_identically() {
    let env = CliTestEnv::new();
    let foreign_repo = seed_repo(&env, "someone_else", 10, "not-mine");
    let foreign_doc = seed_documentation(&env, foreign_repo.id, &[(0, "<p>secret</p>")]);

    let cases = [foreign_doc.to_string(), "999999".to_string(), "abc".to_string()];
    for case in &cases {
        let output = run_bin(&env, "repodocs", &["docs", case]);
        assert_eq!(
            output.status.code(),
            Some(1),
            "docs {case} must fail with the same exit code"
        );
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains(&format!("documentation not found: {case}")),
            "docs {case} should collapse to not-found, got: {stderr}"
        );
        assert!(
            !String::from_utf8_lossy(&output.stdout).contains("secret"),
            "foreign content must never leak"
        );
    }
}

#[test]
fn import_docs_builds_a_viewable_run() {
    let env = CliTestEnv::new();
    let repo = seed_repo(&env, TEST_USER, 10, "imported");

    let fragments = env.scratch_dir("fragments");
    fs::write(fragments.join("01-intro.html"), "<h2>Intro</h2>").unwrap();
    fs::write(fragments.join("02-api.html"), "<h2>API</h2>").unwrap();

    let repo_arg = repo.id.to_string();
    let dir_arg = fragments.to_string_lossy().into_owned();
    let args = ["import-docs", repo_arg.as_str(), dir_arg.as_str()];

    let output = run_bin(&env, "repodocs", &args);
    assert_success("repodocs", &args, &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Imported 2 chunk(s)"));

    let summaries = env.open_db().list_repos_with_docs(TEST_USER).unwrap();
    let doc_id = summaries[0].latest_doc_id.expect("run should be recorded");

    let doc_arg = doc_id.to_string();
    let view = run_bin(&env, "repodocs", &["docs", &doc_arg]);
    assert_success("repodocs", &["docs", &doc_arg], &view);
    let stdout = String::from_utf8_lossy(&view.stdout);
    assert!(stdout.contains("<h2>Intro</h2>"));
    assert!(stdout.contains("<h2>API</h2>"));
}

#[test]
fn import_docs_for_foreign_repo_fails_closed() {
    let env = CliTestEnv::new();
    let foreign = seed_repo(&env, "someone_else", 10, "not-mine");

    let fragments = env.scratch_dir("fragments");
    fs::write(fragments.join("01.html"), "<p>nope</p>").unwrap();

    let repo_arg = foreign.id.to_string();
    let dir_arg = fragments.to_string_lossy().into_owned();
    let args = ["import-docs", repo_arg.as_str(), dir_arg.as_str()];

    let output = run_bin(&env, "repodocs", &args);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("repository not found"));

    let summaries = env.open_db().list_repos_with_docs("someone_else").unwrap();
    assert_eq!(summaries[0].doc_count, 0, "no run may be attached");
}
