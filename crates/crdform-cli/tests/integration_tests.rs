//! Integration tests for CLI commands

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const RETRY: &str = "kuma_io_mesh_retry_v1alpha1";

const RETRY_CONFIG: &str = r#"metadata:
  name: retry
  namespace: kuma-system
spec:
  target_ref:
    kind: MeshService
    name: backend
  to:
    - target_ref:
        kind: Mesh
      default:
        tcp:
          max_connect_attempt: 5
"#;

/// Run crdform with an empty provider config so the user's own is never read
fn crdform(workdir: &Path, args: &[&str]) -> Output {
    let config = workdir.join("provider.yaml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    Command::new(env!("CARGO_BIN_EXE_crdform"))
        .args(args)
        .arg("--config")
        .arg(&config)
        .env_remove("CRDFORM_LOG")
        .output()
        .expect("Failed to execute crdform")
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod types_command {
    use super::*;

    #[test]
    fn test_lists_bundled_types() {
        let dir = TempDir::new().unwrap();
        let output = crdform(dir.path(), &["types"]);

        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains(RETRY));
        assert!(out.contains("kuma_io_mesh_v1alpha1_manifest"));
    }

    #[test]
    fn test_json_listing() {
        let dir = TempDir::new().unwrap();
        let output = crdform(dir.path(), &["types", "--json"]);

        let listing: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        let resources = listing["resources"].as_array().unwrap();
        assert!(resources.iter().any(|r| r == RETRY));
        assert_eq!(
            listing["resources"].as_array().unwrap().len(),
            listing["manifests"].as_array().unwrap().len()
        );
    }

    #[test]
    fn test_extra_crd_file() {
        let dir = TempDir::new().unwrap();
        let crd = write(
            &dir,
            "widgets.yaml",
            r#"apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  scope: Namespaced
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                size:
                  type: integer
"#,
        );

        let output = crdform(dir.path(), &["types", "--crds", &crd]);
        assert!(output.status.success(), "{}", stderr(&output));
        assert!(stdout(&output).contains("example_com_widget_v1"));
    }

    #[test]
    fn test_missing_crd_file() {
        let dir = TempDir::new().unwrap();
        let output = crdform(dir.path(), &["types", "--crds", "/nonexistent/crds.yaml"]);
        assert_eq!(output.status.code(), Some(4));
    }
}

mod schema_command {
    use super::*;

    #[test]
    fn test_schema_is_json() {
        let dir = TempDir::new().unwrap();
        let output = crdform(dir.path(), &["schema", RETRY]);

        assert!(output.status.success(), "{}", stderr(&output));
        let schema: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert!(schema.is_object());
    }

    #[test]
    fn test_unknown_type_suggests() {
        let dir = TempDir::new().unwrap();
        let output = crdform(dir.path(), &["schema", "kuma_io_mesh_retri_v1alpha1"]);

        assert_eq!(output.status.code(), Some(3));
        let err = stderr(&output);
        assert!(err.contains("unknown resource type 'kuma_io_mesh_retri_v1alpha1'"));
        assert!(err.contains(RETRY));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_valid_config() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "retry.yaml", RETRY_CONFIG);
        let output = crdform(dir.path(), &["validate", RETRY, "-f", &file]);

        assert!(output.status.success(), "{}", stderr(&output));
        assert!(stderr(&output).contains("Validation passed"));
    }

    #[test]
    fn test_unknown_attribute_fails() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "retry.yaml", RETRY_CONFIG);
        let output = crdform(
            dir.path(),
            &["validate", RETRY, "-f", &file, "--set", "spec.targte_ref=x"],
        );

        assert_eq!(output.status.code(), Some(2));
        let err = stderr(&output);
        assert!(err.contains("unknown attribute"));
        assert!(err.contains("did you mean 'target_ref'?"));
    }

    #[test]
    fn test_json_output() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "retry.yaml", RETRY_CONFIG);
        let output = crdform(dir.path(), &["validate", RETRY, "-f", &file, "--json"]);

        let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(result["valid"], true);
        assert_eq!(result["type_name"], RETRY);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let output = crdform(dir.path(), &["validate", RETRY, "-f", "/nonexistent/retry.yaml"]);
        assert_eq!(output.status.code(), Some(5));
    }
}

mod render_command {
    use super::*;

    #[test]
    fn test_render_cluster_scoped_manifest() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "mesh.yaml",
            "metadata:\n  name: default\nspec:\n  mtls:\n    enabled_backend: ca-1\n",
        );
        let output = crdform(dir.path(), &["render", "kuma_io_mesh_v1alpha1", "-f", &file]);

        assert!(output.status.success(), "{}", stderr(&output));
        insta::assert_snapshot!(stdout(&output), @r"
        apiVersion: kuma.io/v1alpha1
        kind: Mesh
        metadata:
          name: default
        spec:
          mtls:
            enabledBackend: ca-1
        ");
    }

    #[test]
    fn test_render_writes_state() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "retry.yaml", RETRY_CONFIG);
        let state_path = dir.path().join("state.json");
        let output = crdform(
            dir.path(),
            &[
                "render",
                &format!("{}_manifest", RETRY),
                "-f",
                &file,
                "-o",
                &state_path.to_string_lossy(),
            ],
        );

        assert!(output.status.success(), "{}", stderr(&output));
        assert!(stdout(&output).contains("maxConnectAttempt: 5"));
        let state: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&state_path).unwrap()).unwrap();
        assert_eq!(state["id"], "kuma-system/retry");
    }
}

mod cluster_commands {
    use super::*;

    #[test]
    fn test_apply_offline_fails() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "retry.yaml", RETRY_CONFIG);
        let output = crdform(dir.path(), &["apply", RETRY, "-f", &file, "--offline"]);

        assert_eq!(output.status.code(), Some(3));
        assert!(stderr(&output).contains("no cluster connection is configured"));
    }

    #[test]
    fn test_delete_offline_fails() {
        let dir = TempDir::new().unwrap();
        let state = write(&dir, "state.json", r#"{ "id": "kuma-system/retry" }"#);
        let output = crdform(dir.path(), &["delete", RETRY, "--state", &state, "--offline"]);

        assert_eq!(output.status.code(), Some(3));
    }
}
