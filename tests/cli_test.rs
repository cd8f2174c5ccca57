//! CLI integration tests for the schema-traits binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("schema-traits"))
}

// Helper to create a temp schema file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const POINT_SCHEMA: &str = r##"{
    "definitions": {
        "Point": {
            "type": "object",
            "properties": {
                "x": {"type": "number"},
                "y": {"type": "number"}
            }
        }
    },
    "type": "object",
    "properties": {
        "p": {"$ref": "#/definitions/Point"}
    }
}"##;

mod resolve_command {
    use super::*;

    #[test]
    fn basic_resolve() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", POINT_SCHEMA);

        cmd()
            .args(["resolve", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""name":"Point""#))
            .stdout(predicate::str::contains(r#""name":"RootInstance""#))
            .stdout(predicate::str::contains(r#""imports":["Point"]"#));
    }

    #[test]
    fn resolve_with_pretty() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", POINT_SCHEMA);

        cmd()
            .args(["resolve", schema.to_str().unwrap(), "--pretty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\n  \"types\": ["));
    }

    #[test]
    fn resolve_text_format() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", POINT_SCHEMA);

        cmd()
            .args(["resolve", schema.to_str().unwrap(), "--format", "text"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Point (object, object)"))
            .stdout(predicate::str::contains("  x?: number"))
            .stdout(predicate::str::contains("  p?: Point"))
            .stdout(predicate::str::contains("  uses: Point"));
    }

    #[test]
    fn resolve_with_root_name() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", POINT_SCHEMA);

        cmd()
            .args(["resolve", schema.to_str().unwrap(), "--root-name", "Shape"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""name":"Shape""#))
            .stdout(predicate::str::contains("RootInstance").not());
    }

    #[test]
    fn resolve_with_definition_tag() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{"$defs": {"Id": {"type": "string"}}, "properties": {}}"#,
        );

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--definition-tag",
                "$defs",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""name":"Id""#));
    }

    #[test]
    fn resolve_to_output_file() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", POINT_SCHEMA);
        let output = dir.path().join("types.json");

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["types"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn resolve_from_stdin() {
        cmd()
            .args(["resolve", "-"])
            .write_stdin(POINT_SCHEMA)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""name":"Point""#));
    }
}

mod classify_command {
    use super::*;

    #[test]
    fn classify_root() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", POINT_SCHEMA);

        cmd()
            .args(["classify", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""is_object": true"#))
            .stdout(predicate::str::contains(r#""is_trait": false"#))
            .stdout(predicate::str::contains(r#""extractor": "object""#));
    }

    #[test]
    fn classify_pointer() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", POINT_SCHEMA);

        cmd()
            .args([
                "classify",
                schema.to_str().unwrap(),
                "--pointer",
                "#/properties/p",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""is_reference": true"#))
            .stdout(predicate::str::contains(r#""extractor": "ref_object""#))
            .stdout(predicate::str::contains(r##""pointer": "#/properties/p""##));
    }

    #[test]
    fn classify_exclusive_compounds() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{"allOf": [
                {"properties": {"a": {"type": "string"}}},
                {"type": "string", "properties": {"b": {"type": "string"}}}
            ]}"#,
        );

        cmd()
            .args(["classify", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""is_trait": true"#));

        cmd()
            .args(["classify", schema.to_str().unwrap(), "--exclusive-compounds"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""is_trait": false"#));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn missing_file_exits_3() {
        cmd()
            .args(["resolve", "/nonexistent/schema.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn invalid_json_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", "{ not json");

        cmd()
            .args(["resolve", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn reference_cycle_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r##"{
                "definitions": {
                    "Foo": {"$ref": "#/definitions/Bar"},
                    "Bar": {"$ref": "#/definitions/Foo"}
                },
                "properties": {"foo": {"$ref": "#/definitions/Foo"}}
            }"##,
        );

        cmd()
            .args(["resolve", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("cyclic $ref"));
    }

    #[test]
    fn unknown_pointer_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", POINT_SCHEMA);

        cmd()
            .args([
                "classify",
                schema.to_str().unwrap(),
                "--pointer",
                "#/definitions/Line",
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("#/definitions/Line"));
    }
}
