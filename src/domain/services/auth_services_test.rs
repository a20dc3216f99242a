use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use super::AuthState;
use super::AuthStore;

fn temp_store(name: &str) -> AuthStore {
    let path: PathBuf = env::temp_dir()
        .join(format!("dcfdesk-test-{}", std::process::id()))
        .join(format!("{name}.json"));
    let _ = fs::remove_file(&path);

    return AuthStore::new(path);
}

#[test]
fn it_reads_missing_files_as_signed_out() {
    let store = temp_store("missing");

    assert_eq!(store.load(), AuthState::default());
    assert_eq!(store.token(), None);
    insta::assert_snapshot!(store.require_token().unwrap_err().to_string(), @"You are not signed in. Run `dcfdesk login` first.");
}

#[test]
fn it_persists_tokens() -> Result<()> {
    let store = temp_store("persist");
    store.set_token("abc123")?;

    assert_eq!(store.token(), Some("abc123".to_string()));
    insta::assert_snapshot!(fs::read_to_string(&store.file_path)?, @r###"{"token":"abc123","is_authenticated":true}"###);

    return Ok(());
}

#[test]
fn it_clears_tokens() -> Result<()> {
    let store = temp_store("clear");
    store.set_token("abc123")?;
    store.clear()?;

    assert_eq!(
        store.load(),
        AuthState {
            token: None,
            is_authenticated: false
        }
    );

    return Ok(());
}

#[test]
fn it_ignores_corrupt_files() -> Result<()> {
    let store = temp_store("corrupt");
    fs::create_dir_all(store.file_path.parent().unwrap())?;
    fs::write(&store.file_path, "not json")?;

    assert_eq!(store.token(), None);

    return Ok(());
}
