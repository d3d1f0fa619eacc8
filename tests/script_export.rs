use playwise::script::ScriptRunner;
use playwise::{EngineConfig, ExportConfig, PlaylistEngine, SnapshotExporter};
use std::fs;
use tempfile::TempDir;

const SCRIPT: &str = r#"
# build a small playlist
{"op":"add","title":"Morning","artist":"Sun","duration":185,"rating":4,"label":"m"}
{"op":"add","title":"Noon","artist":"Sun","duration":95,"rating":5,"label":"n"}
{"op":"add","title":"Night","artist":"Moon","duration":300,"rating":2,"label":"x"}
{"op":"play","song":"n"}
{"op":"rate","song":"x","rating":3}
{"op":"sort","by":"duration","algorithm":"quick"}
{"op":"search_title","title":"NOON"}
{"op":"query_range","min":3,"max":5}
{"op":"block","artist":"Moon"}
{"op":"add","title":"Eclipse","artist":"Moon","duration":60,"rating":1}
"#;

#[test]
fn test_script_run_then_export() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("out").join("playlist.json");

    let mut runner = ScriptRunner::new(PlaylistEngine::new(EngineConfig::default()))
        .with_consistency_checks(true);
    let mut out = Vec::new();
    let summary = runner.run(SCRIPT.as_bytes(), &mut out).unwrap();

    assert_eq!(summary.commands, 10);
    assert_eq!(summary.failures, 1);

    let outcomes: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(outcomes[6]["result"][0]["title"], "Noon");
    assert_eq!(outcomes[7]["result"].as_array().unwrap().len(), 3);
    assert_eq!(outcomes[9]["ok"], false);

    let mut engine = runner.into_engine();
    let titles: Vec<&str> = engine.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Noon", "Morning", "Night"]);

    let exporter = SnapshotExporter::new(ExportConfig::new(path.clone()).without_metrics());
    exporter.export(&engine.full_snapshot()).unwrap();
    assert!(path.exists());

    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains("performance_metrics"));

    let loaded = exporter.load().unwrap();
    assert_eq!(loaded.total_songs, 3);
    assert_eq!(loaded.total_duration, 580);
    assert_eq!(loaded.rating_distribution[&3], 1);
    assert_eq!(loaded.recent_history.len(), 1);
    assert_eq!(loaded.blocked_artists, vec!["Moon".to_string()]);
    assert_eq!(loaded.duration_stats.shortest_song.unwrap().title, "Noon");
}

#[test]
fn test_purge_on_block_through_script() {
    let script = r#"{"op":"add","title":"A","artist":"Gone","duration":10,"rating":1}
{"op":"add","title":"B","artist":"Stays","duration":20,"rating":2}
{"op":"block","artist":"gone"}
{"op":"undo"}
"#;
    let config = EngineConfig::new()
        .with_purge_on_block(true)
        .with_artist_matching(playwise::index::ArtistMatching::CaseInsensitive);
    let mut runner = ScriptRunner::new(PlaylistEngine::new(config));
    let mut out = Vec::new();
    runner.run(script.as_bytes(), &mut out).unwrap();

    // undo brings back the purged song even though its artist is still blocked
    let engine = runner.engine();
    assert_eq!(engine.len(), 2);
    assert!(engine.is_blocked("GONE"));
}
