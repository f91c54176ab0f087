use assert_cmd::Command;

const DOCUMENT: &str = r#"{
    "store": {
        "books": [
            {"title": "Dune", "price": 9},
            {"title": "Emma", "price": 15},
            {"title": "Ivanhoe", "price": 22}
        ],
        "owner": "Ann"
    }
}"#;

#[test]
fn test_cli_select_with_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("arbor")?;

    let assert = cmd
        .arg("-c")
        .arg("select")
        .arg("store/books/*[price > 10]/title")
        .write_stdin(DOCUMENT)
        .assert();
    assert.success().code(0).stdout("[\"Emma\",\"Ivanhoe\"]\n");

    Ok(())
}

#[test]
fn test_cli_select_pointers() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("arbor")?;

    let assert = cmd
        .arg("select")
        .arg("--pointers")
        .arg("//title[contains(., 'a')]")
        .write_stdin(DOCUMENT)
        .assert();
    assert.success().code(0).stdout("/0/0/1/1\n/0/0/2/1\n");

    Ok(())
}

#[test]
fn test_cli_select_with_pointers() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("arbor")?;

    let assert = cmd
        .arg("-c")
        .arg("select")
        .arg("--with-pointers")
        .arg("store/owner")
        .write_stdin(DOCUMENT)
        .assert();
    assert
        .success()
        .code(0)
        .stdout("[{\"pointer\":\"/0/1\",\"value\":\"Ann\"}]\n");

    Ok(())
}

#[test]
fn test_cli_patch_test_compares_numbers_by_value() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("arbor")?;

    let assert = cmd
        .arg("-c")
        .arg("patch")
        .arg(r#"[{"op": "test", "path": "/store/books/0/price", "value": 9.0}]"#)
        .write_stdin(DOCUMENT)
        .assert();
    assert.success().code(0);

    Ok(())
}

#[test]
fn test_cli_patch_with_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("arbor")?;

    let assert = cmd
        .arg("--compact-output")
        .arg("patch")
        .arg(r#"[{"op": "move", "from": "/store/books/0", "path": "/store/books/-"}, {"op": "remove", "path": "/store/owner"}]"#)
        .write_stdin(DOCUMENT)
        .assert();
    assert.success().code(0).stdout(
        "{\"store\":{\"books\":[{\"price\":15,\"title\":\"Emma\"},{\"price\":22,\"title\":\"Ivanhoe\"},{\"price\":9,\"title\":\"Dune\"}]}}\n",
    );

    Ok(())
}

#[test]
fn test_cli_pointer() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("arbor")?;

    let assert = cmd
        .arg("pointer")
        .arg("/store/books/1/price")
        .arg("-c")
        .write_stdin(DOCUMENT)
        .assert();
    assert.success().code(0).stdout("15\n");

    Ok(())
}

#[test]
fn test_cli_eval() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("arbor")?;

    let assert = cmd
        .arg("eval")
        .arg("1 + 2 * 3")
        .write_stdin("{}")
        .assert();
    assert.success().code(0).stdout("7\n");

    Ok(())
}

#[test]
fn test_cli_invalid_selector() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("arbor")?;

    let assert = cmd.arg("select").arg("book[1").write_stdin(DOCUMENT).assert();
    assert.failure().code(1);

    Ok(())
}

#[test]
fn test_cli_failed_test_operation() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("arbor")?;

    let assert = cmd
        .arg("patch")
        .arg(r#"[{"op": "test", "path": "/store/owner", "value": "Bob"}]"#)
        .write_stdin(DOCUMENT)
        .assert();
    assert.failure().code(1);

    Ok(())
}
