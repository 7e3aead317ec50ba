use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::TempDir;
use tokio::sync::mpsc;
use trawl_walk::{Finder, Match, SearchError, SearchEvent};

/// `r/{a.txt, b.json, sub/c.txt}`
fn create_test_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), "alpha").unwrap();
    fs::write(root.join("b.json"), "{}").unwrap();
    fs::write(root.join("sub/c.txt"), "gamma").unwrap();

    temp
}

fn paths(matches: Vec<Match>) -> Vec<PathBuf> {
    matches.into_iter().map(Match::into_path).collect()
}

fn rel(root: &Path, parts: &[&str]) -> Vec<PathBuf> {
    parts.iter().map(|p| root.join(p)).collect()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<SearchEvent>) -> Vec<SearchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_extension_filter_unlimited_depth() {
    let temp = create_test_tree();
    let finder = Finder::new().path(temp.path()).ext(["txt"]);

    let expected = rel(temp.path(), &["a.txt", "sub/c.txt"]);
    assert_eq!(paths(finder.find_sync().unwrap()), expected);
    assert_eq!(paths(finder.find().await.unwrap()), expected);
}

#[tokio::test]
async fn test_depth_zero_yields_direct_children_only() {
    let temp = create_test_tree();
    fs::create_dir_all(temp.path().join("sub/deep")).unwrap();
    fs::write(temp.path().join("sub/deep/d.txt"), "").unwrap();

    let finder = Finder::new().path(temp.path()).depth(0).ext([".txt"]);

    let expected = rel(temp.path(), &["a.txt"]);
    assert_eq!(paths(finder.find_sync().unwrap()), expected);
    assert_eq!(paths(finder.find().await.unwrap()), expected);
}

#[test]
fn test_empty_matches_zero_byte_files_only() {
    let temp = create_test_tree();
    fs::write(temp.path().join("zero"), "").unwrap();
    fs::write(temp.path().join("one"), "1").unwrap();

    let found = paths(Finder::new().path(temp.path()).empty().find_sync().unwrap());
    assert_eq!(found, rel(temp.path(), &["zero"]));
}

#[test]
fn test_size_expression() {
    let temp = create_test_tree();
    let found = paths(Finder::new().path(temp.path()).size(">= 5").find_sync().unwrap());
    assert_eq!(found, rel(temp.path(), &["a.txt", "sub/c.txt"]));
}

#[test]
fn test_no_filters_matches_every_file() {
    let temp = create_test_tree();
    let found = paths(Finder::new().path(temp.path()).find_sync().unwrap());
    assert_eq!(found, rel(temp.path(), &["a.txt", "b.json", "sub/c.txt"]));
}

#[test]
fn test_negation_inverts_whole_chain() {
    let temp = create_test_tree();
    let found = paths(
        Finder::new()
            .path(temp.path())
            .ext(["txt"])
            .size(">0")
            .negate()
            .find_sync()
            .unwrap(),
    );
    assert_eq!(found, rel(temp.path(), &["b.json"]));
}

#[test]
fn test_discard_combines_with_negation() {
    let temp = create_test_tree();
    // not(ext == json AND path !~ /sub/) == ext != json OR path ~ /sub/
    let found = paths(
        Finder::new()
            .path(temp.path())
            .ext(["json"])
            .discard(["/sub/"])
            .negate()
            .find_sync()
            .unwrap(),
    );
    assert_eq!(found, rel(temp.path(), &["a.txt", "sub/c.txt"]));

    let found = paths(Finder::new().path(temp.path()).discard(["/sub/"]).find_sync().unwrap());
    assert_eq!(found, rel(temp.path(), &["a.txt", "b.json"]));
}

#[test]
fn test_glob_filter() {
    let temp = create_test_tree();
    let found = paths(Finder::new().path(temp.path()).glob(["*.json", "c.*"]).find_sync().unwrap());
    assert_eq!(found, rel(temp.path(), &["b.json", "sub/c.txt"]));
}

#[tokio::test]
async fn test_hidden_directories_ignored() {
    let temp = create_test_tree();
    fs::create_dir(temp.path().join(".git")).unwrap();
    fs::write(temp.path().join(".git/config.txt"), "").unwrap();

    let finder = Finder::new().path(temp.path()).ext(["txt"]).ignore_hidden_dirs();
    let expected = rel(temp.path(), &["a.txt", "sub/c.txt"]);
    assert_eq!(paths(finder.find_sync().unwrap()), expected);
    assert_eq!(paths(finder.find().await.unwrap()), expected);
}

#[test]
fn test_hidden_files_ignored() {
    let temp = create_test_tree();
    fs::write(temp.path().join(".env"), "").unwrap();

    let all = paths(Finder::new().path(temp.path()).find_sync().unwrap());
    assert!(all.contains(&temp.path().join(".env")));

    let visible = paths(Finder::new().path(temp.path()).ignore_hidden_files().find_sync().unwrap());
    assert!(!visible.contains(&temp.path().join(".env")));
    assert_eq!(visible.len(), 3);
}

#[test]
fn test_nested_roots_not_double_counted_without_depth() {
    let temp = create_test_tree();
    let finder = Finder::new()
        .paths([temp.path().to_path_buf(), temp.path().join("sub")])
        .ext(["txt"]);

    let found = paths(finder.find_sync().unwrap());
    assert_eq!(found, rel(temp.path(), &["a.txt", "sub/c.txt"]));
}

#[test]
fn test_nested_roots_kept_with_depth_limit() {
    let temp = create_test_tree();
    let finder = Finder::new()
        .paths([temp.path().to_path_buf(), temp.path().join("sub")])
        .depth(5)
        .ext(["txt"]);

    let found = paths(finder.find_sync().unwrap());
    assert_eq!(found, rel(temp.path(), &["a.txt", "sub/c.txt", "sub/c.txt"]));
}

#[tokio::test]
async fn test_directories_only_applies_file_filters_to_directory_names() {
    let temp = create_test_tree();
    fs::create_dir(temp.path().join("notes.txt")).unwrap();

    let finder = Finder::new().path(temp.path()).directories().ext(["txt"]);
    let expected = rel(temp.path(), &["notes.txt"]);
    assert_eq!(paths(finder.find_sync().unwrap()), expected);
    assert_eq!(paths(finder.find().await.unwrap()), expected);

    let all_dirs = paths(Finder::new().path(temp.path()).directories().find_sync().unwrap());
    assert_eq!(all_dirs, rel(temp.path(), &["notes.txt", "sub"]));
}

#[test]
fn test_include_stats() {
    let temp = create_test_tree();
    let results = Finder::new()
        .path(temp.path())
        .ext(["txt"])
        .include_stats()
        .find_sync()
        .unwrap();

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.stats().unwrap().size, 5);
    }
}

#[tokio::test]
async fn test_finder_is_reusable() {
    let temp = create_test_tree();
    let finder = Finder::new().path(temp.path()).ext(["txt"]);

    let first = finder.find().await.unwrap();
    fs::write(temp.path().join("new.txt"), "").unwrap();
    let second = finder.find().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 3);
}

#[tokio::test]
async fn test_events_in_file_mode() {
    let temp = create_test_tree();
    let finder = Finder::new().path(temp.path()).ext(["txt"]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let results = finder.find_observed(&tx).await.unwrap();
    let events = drain(&mut rx);

    let matched: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SearchEvent::Match(path) => Some(path.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(matched, paths(results));
    assert_eq!(events.last(), Some(&SearchEvent::End));
    assert_eq!(events.iter().filter(|e| **e == SearchEvent::End).count(), 1);
    assert!(!events.iter().any(|e| matches!(e, SearchEvent::Error(_))));
}

#[tokio::test]
async fn test_no_match_events_in_directory_mode() {
    let temp = create_test_tree();
    let finder = Finder::new().path(temp.path()).directories();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let results = finder.find_observed(&tx).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(drain(&mut rx), vec![SearchEvent::End]);
}

#[tokio::test]
async fn test_invalid_expression_fails_before_walking() {
    let finder = Finder::new()
        .path("/this/root/does/not/exist")
        .modified("around yesterday");

    assert!(matches!(finder.find_sync(), Err(SearchError::InvalidExpression(_))));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let result = finder.find_observed(&tx).await;
    assert!(matches!(result, Err(SearchError::InvalidExpression(_))));

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], SearchEvent::Error(_)));
    assert_eq!(events[1], SearchEvent::End);
}

#[tokio::test]
async fn test_invalid_glob_is_reported() {
    let finder = Finder::new().glob(["[unclosed"]);
    assert!(matches!(finder.find().await, Err(SearchError::InvalidPattern { .. })));
}

#[tokio::test]
async fn test_missing_root_fails_whole_search() {
    let temp = create_test_tree();
    let finder = Finder::new()
        .path(temp.path())
        .path(temp.path().join("missing"))
        .depth(3);

    assert!(matches!(finder.find_sync(), Err(SearchError::NotFound { .. })));

    let (tx, mut rx) = mpsc::unbounded_channel();
    assert!(finder.find_observed(&tx).await.is_err());
    let events = drain(&mut rx);
    let error_at = events
        .iter()
        .position(|e| matches!(e, SearchEvent::Error(_)))
        .unwrap();
    assert_eq!(events.last(), Some(&SearchEvent::End));
    assert_eq!(error_at, events.len() - 2);
}

#[tokio::test]
async fn test_predicate_error_fails_whole_search() {
    let temp = create_test_tree();
    let finder = Finder::new().path(temp.path()).add_filter(|entry| {
        Err(SearchError::InvalidConfig {
            message: format!("refused {}", entry.name()),
        })
    });

    assert!(finder.find_sync().is_err());
    assert!(finder.find().await.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_directory_fails_whole_search() {
    use std::os::unix::fs::PermissionsExt;

    let temp = create_test_tree();
    let sub = temp.path().join("sub");
    fs::set_permissions(&sub, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still list it. The engine tests cover a nested
    // listing failure without relying on permissions.
    if fs::read_dir(&sub).is_ok() {
        fs::set_permissions(&sub, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let finder = Finder::new().path(temp.path()).ext(["txt"]);
    let sync = finder.find_sync();
    let async_ = finder.find().await;

    fs::set_permissions(&sub, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(sync, Err(SearchError::PermissionDenied { .. })));
    assert!(matches!(async_, Err(SearchError::PermissionDenied { .. })));
}

#[tokio::test]
async fn test_callback_receives_result() {
    let temp = create_test_tree();
    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();

    let results = Finder::new()
        .path(temp.path())
        .ext(["json"])
        .find_with_callback(move |result| {
            assert_eq!(result.as_ref().unwrap().len(), 1);
            flag.store(true, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert!(called.load(Ordering::SeqCst));
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_any_concatenates_in_argument_order() {
    let temp = create_test_tree();
    let results = Finder::any([
        Finder::new().path(temp.path()).ext(["json"]),
        Finder::new().path(temp.path()).ext(["txt"]),
    ])
    .await
    .unwrap();

    assert_eq!(paths(results), rel(temp.path(), &["b.json", "a.txt", "sub/c.txt"]));
}

#[tokio::test]
async fn test_multiple_roots_are_root_major() {
    let first = create_test_tree();
    let second = create_test_tree();
    let finder = Finder::new()
        .paths([second.path(), first.path()])
        .ext(["json"]);

    let expected = vec![second.path().join("b.json"), first.path().join("b.json")];
    assert_eq!(paths(finder.find_sync().unwrap()), expected);
    assert_eq!(paths(finder.find().await.unwrap()), expected);
}
