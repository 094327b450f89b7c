// tests/ingest_config.rs
use draw_ranker::ingest::config::load_sources_from;
use std::fs;

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("mega_sources.toml");
    fs::write(
        &p_toml,
        r#"
[[sources]]
name = " ketquadientoan "
url = "https://www.ketquadientoan.com/tat-ca-ky-xo-so-mega-6-45.html"

[[sources]]
name = "empty"
url = ""

[[sources]]
name = "minhngoc"
url = "https://www.minhngoc.net.vn/ket-qua-xo-so/dien-toan-vietlott/mega-6x45.html"
"#,
    )
    .unwrap();
    let v = load_sources_from(&p_toml).unwrap();
    let names: Vec<_> = v.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["ketquadientoan", "minhngoc"]);

    let p_json = dir.path().join("power_sources.json");
    fs::write(
        &p_json,
        r#"[{"name":"lotto-8","url":"https://www.lotto-8.com/Vietnam/listltoVM55.asp"},
            {"name":"again","url":" https://www.lotto-8.com/Vietnam/listltoVM55.asp "}]"#,
    )
    .unwrap();
    let vj = load_sources_from(&p_json).unwrap();
    assert_eq!(vj.len(), 1);
    assert_eq!(vj[0].name, "lotto-8");
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_sources_from(&dir.path().join("nope.toml")).is_err());
}
