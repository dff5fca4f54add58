use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Site {
    dir: TempDir,
}

impl Site {
    fn new(prefix: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_dir = dir.path().join(".classtrace");
        fs::create_dir_all(&config_dir).expect("config dir");
        fs::write(
            config_dir.join("config.toml"),
            format!("[options]\nproject_prefix = \"{prefix}\"\n"),
        )
        .expect("write config");
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn page(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("page dir");
        fs::write(&path, contents).expect("write page");
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("classtrace").expect("binary exists");
        cmd.env("XDG_CONFIG_HOME", self.root().join("xdg"))
            .env_remove("CLASSTRACE_PROJECT_PREFIX")
            .env_remove("CLASSTRACE_RULE")
            .arg("--root")
            .arg(self.root());
        cmd
    }
}

#[test]
fn apply_writes_class_into_tag() {
    let site = Site::new("Shop");
    let page = site.page("views/summary.html", "<p>x</p>");

    site.cmd()
        .arg("apply")
        .arg(&page)
        .args(["--offset", "4", "--rule", "ruleGamma"])
        .assert()
        .success()
        .stdout("shop--yrammus\n");

    assert_eq!(
        fs::read_to_string(&page).unwrap(),
        r#"<p class="shop--yrammus">x</p>"#
    );
}

#[test]
fn apply_twice_leaves_file_unchanged() {
    let site = Site::new("Shop");
    let page = site.page("views/summary.html", "<ul>\n  <li class=\"item\">one</li>\n</ul>");

    for _ in 0..2 {
        site.cmd()
            .arg("apply")
            .arg(&page)
            .args(["--line", "2", "--column", "20", "--rule", "ruleGamma", "--marker"])
            .assert()
            .success();
    }

    assert_eq!(
        fs::read_to_string(&page).unwrap(),
        "<ul>\n  <li class=\"item shop--yrammus\" data-class-origin=\"views/summary.html\">one</li>\n</ul>"
    );
}

#[test]
fn dry_run_prints_tag_without_saving() {
    let site = Site::new("Shop");
    let page = site.page("summary.html", "<img src=\"a.png\" />");

    site.cmd()
        .arg("apply")
        .arg(&page)
        .args(["--offset", "0", "--rule", "ruleGamma", "--dry-run"])
        .assert()
        .success()
        .stdout("<img src=\"a.png\" class=\"shop--yrammus\" />\n");

    assert_eq!(fs::read_to_string(&page).unwrap(), "<img src=\"a.png\" />");
}

#[test]
fn json_report_describes_the_edit() {
    let site = Site::new("Shop");
    let page = site.page("summary.html", "<main><p>x</p></main>");

    let output = site
        .cmd()
        .arg("apply")
        .arg(&page)
        .args(["--offset", "9", "--rule", "ruleGamma", "--json", "--dry-run"])
        .output()
        .expect("command runs");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["class"], "shop--yrammus");
    assert_eq!(report["element"]["tag_name"], "p");
    assert_eq!(report["edit"]["span"]["start"], 6);
    assert_eq!(report["edit"]["span"]["end"], 9);
    assert_eq!(report["ancestors"], serde_json::json!(["main", "p"]));
    assert_eq!(report["written"], false);
}

#[test]
fn generate_uses_ad_hoc_options() {
    let site = Site::new("Shop");
    let page = site.page("summary.html", "<nav><a href=\"/\">Home</a></nav>");

    site.cmd()
        .arg("generate")
        .arg(&page)
        .args(["--offset", "17", "--options", "projectPrefix,abbreviatedDomPosition"])
        .args(["--separator", "_"])
        .assert()
        .success()
        .stdout("shop_nav-a\n");

    assert_eq!(
        fs::read_to_string(&page).unwrap(),
        "<nav><a href=\"/\">Home</a></nav>"
    );
}

#[test]
fn ancestors_are_joined_with_brackets() {
    let site = Site::new("Shop");
    let page = site.page("a.html", "<body><div><!-- <em> --><span>x</span></div></body>");

    site.cmd()
        .arg("ancestors")
        .arg(&page)
        .args(["--offset", "30"])
        .assert()
        .success()
        .stdout("body>div>span\n");
}

#[test]
fn offset_outside_document_fails() {
    let site = Site::new("Shop");
    let page = site.page("a.html", "<p>x</p>");

    site.cmd()
        .arg("generate")
        .arg(&page)
        .args(["--offset", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside the document"));
}

#[test]
fn text_without_markup_reports_missing_element() {
    let site = Site::new("Shop");
    let page = site.page("a.txt", "just words");

    site.cmd()
        .arg("apply")
        .arg(&page)
        .args(["--offset", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no opening tag found"));
    assert_eq!(fs::read_to_string(&page).unwrap(), "just words");
}

#[test]
fn unknown_rule_is_reported() {
    let site = Site::new("Shop");
    let page = site.page("a.html", "<p>x</p>");

    site.cmd()
        .arg("generate")
        .arg(&page)
        .args(["--offset", "0", "--rule", "ruleDelta"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown rule 'ruleDelta'"));
}
