use std::sync::Arc;

use gameshelf::fetch::MemoryFetcher;
use gameshelf::prelude::*;

const GAME: &str = "http://shelf.test/site/game";

fn test_config() -> ShelfConfig {
    ShelfConfig { root_url: "http://shelf.test/site/".into(), ..Default::default() }
}

#[tokio::test]
async fn folders_load_packages_with_embedded_covers() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.json(&format!("{GAME}/games.json"), r#"["snake","broken","tetris"]"#);
    fetcher.json(
        &format!("{GAME}/snake/package.json"),
        r#"{"gameId":"snake-01","name":"Snake","description":"Eat","downloadUrl":"https://dl/snake","size":"2 MB","version":"0.3","comingSoon":true}"#,
    );
    fetcher.bytes(&format!("{GAME}/snake/Cover.png"), b"PNG");
    fetcher.json(&format!("{GAME}/tetris/package.json"), r#"{"name":"Tetris"}"#);

    let shelf = Gameshelf::with_fetcher(test_config(), fetcher);
    let records = shelf.load_admin_records().await.unwrap();

    assert_eq!(records.len(), 2);
    let snake = &records[0];
    assert_eq!(snake.id, "snake-01");
    assert_eq!(snake.version, "0.3");
    assert!(snake.coming_soon);
    assert_eq!(snake.image.as_deref(), Some("data:image/png;base64,UE5H"));
    let tetris = &records[1];
    assert_eq!(tetris.id, "tetris");
    assert_eq!(tetris.description, "No description available");
    assert_eq!(tetris.image, None);
}

#[tokio::test]
async fn games_document_is_the_fallback() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.json(
        "http://shelf.test/site/data/games.json",
        r#"{"games":[{"id":"pong","name":"Pong","description":"Bounce","downloadUrl":"https://dl/pong","comingSoon":false}]}"#,
    );
    let shelf = Gameshelf::with_fetcher(test_config(), fetcher);
    let records = shelf.load_admin_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Pong");
    assert_eq!(records[0].size, "Unknown");
}

#[tokio::test]
async fn folder_records_win_over_document() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.text(&format!("{GAME}/games.txt"), "snake\n");
    fetcher.json(&format!("{GAME}/snake/package.json"), r#"{"name":"Snake"}"#);
    fetcher.json("http://shelf.test/site/data/games.json", r#"{"games":[]}"#);
    let shelf = Gameshelf::with_fetcher(test_config(), fetcher.clone());
    let records = shelf.load_admin_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(!fetcher.requests().iter().any(|r| r.ends_with("/data/games.json")));
}

#[tokio::test]
async fn nothing_anywhere_is_an_empty_list() {
    let shelf = Gameshelf::with_fetcher(test_config(), Arc::new(MemoryFetcher::new()));
    let editor = shelf.open_editor(None).await.unwrap();
    assert!(editor.records().is_empty());
    assert!(!editor.can_edit());
}

#[tokio::test]
async fn incomplete_document_record_does_not_empty_the_list() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.json(
        "http://shelf.test/site/data/games.json",
        r#"{"games":[
            {"id":"pong","name":"Pong","description":"Bounce","downloadUrl":"https://dl/pong"},
            {"id":"snake","name":"Snake","description":"S"},
            {"name":"nameless"}
        ]}"#,
    );
    let shelf = Gameshelf::with_fetcher(test_config(), fetcher);
    let records = shelf.load_admin_records().await.unwrap();
    assert_eq!(records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["pong", "snake"]);
    assert_eq!(records[1].download_url, "#");
}

#[tokio::test]
async fn package_with_numeric_version_is_loaded() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.json(&format!("{GAME}/games.json"), r#"["snake"]"#);
    fetcher.json(&format!("{GAME}/snake/package.json"), r#"{"name":"Snake","version":1.2,"size":40,"comingSoon":1}"#);
    let shelf = Gameshelf::with_fetcher(test_config(), fetcher);
    let records = shelf.load_admin_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].version, "1.2");
    assert_eq!(records[0].size, "40");
    assert!(records[0].coming_soon);
}

#[tokio::test]
async fn persisted_list_survives_reopening() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("games.json");
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.json(
        "http://shelf.test/site/data/games.json",
        r#"{"games":[{"id":"pong","name":"Pong","description":"Bounce","downloadUrl":"https://dl/pong"}]}"#,
    );
    let shelf = Gameshelf::with_fetcher(test_config(), fetcher);

    for (id, name) in [("snake", "Snake"), ("tetris", "Tetris")] {
        let bridge: Arc<dyn HostBridge> = Arc::new(LocalBridge::new(&path).unwrap());
        let mut editor = shelf.open_editor(Some(bridge)).await.unwrap();
        let form = editor.form_mut();
        form.id = Some(id.into());
        form.name = name.into();
        form.description = "d".into();
        form.download_url = format!("https://dl/{id}");
        let outcome = editor.save().await.unwrap();
        assert_eq!(outcome.notice, None);
    }

    let bridge: Arc<dyn HostBridge> = Arc::new(LocalBridge::new(&path).unwrap());
    let editor = shelf.open_editor(Some(bridge)).await.unwrap();
    assert_eq!(editor.records().iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["pong", "snake", "tetris"]);
}
