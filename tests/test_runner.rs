use std::{path::Path, process::Output};

use assert_cmd::Command;

include!(concat!(env!("OUT_DIR"), "/test_files.rs"));

fn do_test(filename: &Path) {
    let expected = find_expects(filename, "// expect: ").join("\n");
    let expected_errors = find_expects(filename, "// expect error: ");

    let output = run_file(filename);

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stdout = stdout.trim_end();

    let stderr = String::from_utf8(output.stderr).unwrap();
    let stderr = stderr.trim_end();

    assert_eq!(expected, stdout, "stdout={}, stderr={}", stdout, stderr);

    if expected_errors.is_empty() {
        assert!(output.status.success(), "stderr={}", stderr);
    } else {
        assert_eq!(output.status.code(), Some(70), "stderr={}", stderr);
        for error in expected_errors {
            assert!(stderr.contains(&error), "expected '{}' in stderr={}", error, stderr);
        }
    }
}

fn run_file(filename: &Path) -> Output {
    let mut cmd = Command::cargo_bin("hop").unwrap();
    cmd.arg("--include").arg("./tests/data/modules").arg(filename).output().unwrap()
}

fn find_expects(filename: &Path, expect_str: &str) -> Vec<String> {
    let content = std::fs::read_to_string(filename)
        .unwrap_or_else(|_| panic!("failed to read {}", filename.display()));

    let mut result = vec![];
    for line in content.lines() {
        let mut indices: Vec<_> = line.match_indices(expect_str).collect();
        if indices.is_empty() {
            continue;
        }

        let (idx, _) = indices.pop().unwrap();
        let target = &line[idx + expect_str.len()..];
        result.push(target.into());
    }

    result
}
