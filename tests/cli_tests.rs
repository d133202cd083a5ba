mod common;

use common::{TestEnv, stdout};
use predicates::prelude::*;
use std::fs;

#[test]
fn init_seeds_default_categories_and_achievements() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Work"))
        .stdout(predicate::str::contains("Hobby"))
        .stdout(predicate::str::contains("Categories: 6/3"));

    env.cmd()
        .args(["achievement", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("streak_100"))
        .stdout(predicate::str::contains("Unlocked 0/11"));
}

#[test]
fn daily_list_is_sorted_by_start() {
    let env = TestEnv::new();
    env.init();
    env.add_block("Afternoon review", "2025-03-10", "14:00", "15:00");
    env.add_block("Morning focus", "2025-03-10", "09:00", "10:00");
    env.add_block("Other day", "2025-03-11", "09:00", "10:00");

    let out = env
        .cmd()
        .args(["block", "list", "--date", "2025-03-10"])
        .assert()
        .success();
    let text = stdout(&out);

    let morning = text.find("Morning focus").expect("morning listed");
    let afternoon = text.find("Afternoon review").expect("afternoon listed");
    assert!(morning < afternoon);
    assert!(!text.contains("Other day"));
    assert!(text.contains("2 block(s)"));
}

#[test]
fn inverted_window_is_rejected() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["block", "add", "Backwards", "--date", "2025-03-10"])
        .args(["--start", "10:00", "--end", "09:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be before end time"));

    env.cmd()
        .args(["block", "add", "Empty", "--date", "2025-03-10"])
        .args(["--start", "10:00", "--end", "10:00"])
        .assert()
        .failure();
}

#[test]
fn unknown_category_is_rejected() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["block", "add", "Piano", "--date", "2025-03-10", "--category", "Music"])
        .args(["--start", "10:00", "--end", "11:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Category not found: Music"));
}

#[test]
fn tracking_feeds_statistics() {
    let env = TestEnv::new();
    env.init();
    let id = env.add_block("Deep work", "2025-03-10", "09:00", "10:00");

    env.cmd()
        .args(["block", "start", &id, "--at", "09:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started 'Deep work' at 09:00"));
    env.cmd()
        .args(["block", "done", &id, "--at", "11:30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("02h 30m"));

    env.cmd()
        .args(["stats", "range", "2025-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2.5h"))
        .stdout(predicate::str::contains("Completed blocks : 1"));

    env.cmd()
        .args(["block", "list", "--date", "2025-03-10", "--completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deep work"))
        .stdout(predicate::str::contains("09:00-11:30"));
}

#[test]
fn deleted_block_disappears_from_lists() {
    let env = TestEnv::new();
    env.init();
    let id = env.add_block("Short lived", "2025-03-10", "09:00", "10:00");

    env.cmd().args(["block", "del", &id]).assert().success();

    env.cmd()
        .args(["block", "list", "--date", "2025-03-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No time blocks found."));
    env.cmd()
        .args(["block", "list", "--period", "2025-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Short lived").not());
    env.cmd().args(["block", "show", &id]).assert().failure();
}

#[test]
fn category_limit_applies_to_free_tier() {
    let env = TestEnv::new();
    env.init();

    // the six defaults already exceed the free cap
    env.cmd()
        .args(["category", "add", "Music", "--color", "#112233"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Category limit reached (3)"));

    for name in ["Hobby", "Family", "Sport", "Rest"] {
        env.cmd().args(["category", "del", name]).assert().success();
    }
    env.cmd()
        .args(["category", "add", "Music", "--color", "#112233"])
        .assert()
        .success();
    env.cmd()
        .args(["category", "add", "Cooking", "--color", "#AABBCC"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Category limit reached (3)"));

    env.cmd()
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Categories: 3/3"));
}

#[test]
fn premium_lifts_category_limit() {
    let env = TestEnv::new();
    env.init();
    env.sign_up("ada@example.com");

    env.cmd()
        .args(["category", "add", "Music", "--color", "#112233"])
        .assert()
        .failure();
    env.cmd()
        .args(["settings", "--premium", "true"])
        .assert()
        .success();
    for (name, color) in [
        ("Music", "#112233"),
        ("Garden", "#445566"),
        ("Chess", "#778899"),
        ("Cooking", "#AABBCC"),
    ] {
        env.cmd()
            .args(["category", "add", name, "--color", color])
            .assert()
            .success();
    }

    env.cmd()
        .arg("settings")
        .assert()
        .success()
        .stdout(predicate::str::contains("premium"));
}

#[test]
fn category_in_use_cannot_be_deleted() {
    let env = TestEnv::new();
    env.init();
    env.cmd()
        .args(["block", "add", "Scales", "--date", "2025-03-10", "--category", "Hobby"])
        .args(["--start", "18:00", "--end", "19:00"])
        .assert()
        .success();

    env.cmd()
        .args(["category", "del", "Hobby"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("still used by time blocks"));
    env.cmd().args(["category", "del", "Family"]).assert().success();
}

#[test]
fn settings_need_a_signed_in_user() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["settings", "--theme", "dark"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn auth_round_trip() {
    let env = TestEnv::new();
    env.init();
    env.sign_up("ada@example.com");

    env.cmd()
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as ada@example.com"));

    env.cmd().args(["auth", "sign-out"]).assert().success();
    env.cmd()
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));

    env.cmd()
        .args(["auth", "sign-in", "ada@example.com", "--password", "wrong-one"])
        .assert()
        .failure();
    env.cmd()
        .args(["auth", "sign-in", "ada@example.com", "--password", "secret123"])
        .assert()
        .success();
}

#[test]
fn pushed_blocks_can_be_pulled_into_another_database() {
    let env = TestEnv::new();
    env.init();
    env.sign_up("ada@example.com");
    env.add_block("Synced block", "2025-03-10", "09:00", "10:00");

    env.cmd()
        .args(["sync", "push"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pushed"));
    env.cmd()
        .args(["sync", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending   : 0 change(s)"));

    let laptop = env.other_db("laptop.sqlite");
    env.init_on(&laptop);
    env.cmd_on(&laptop)
        .args(["sync", "pull"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pulled 1 block(s)"));
    env.cmd_on(&laptop)
        .args(["block", "list", "--date", "2025-03-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced block"));
}

#[test]
fn sync_requires_sign_in() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["sync", "push"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn jobs_schedule_list_and_cancel() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["jobs", "schedule"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 periodic job(s) scheduled."));
    env.cmd()
        .args(["jobs", "schedule"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already scheduled"));

    env.cmd()
        .args(["jobs", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("achievement_check"))
        .stdout(predicate::str::contains("statistics_calculation"))
        .stdout(predicate::str::contains("sync_data"));

    env.cmd()
        .args(["jobs", "cancel", "sync_data"])
        .assert()
        .success();
    env.cmd()
        .args(["jobs", "cancel", "sync_data"])
        .assert()
        .failure();
    env.cmd()
        .args(["jobs", "cancel-all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 job(s) cancelled."));
}

#[test]
fn adding_a_block_queues_delayed_achievement_check() {
    let env = TestEnv::new();
    env.init();
    env.add_block("Anything", "2025-03-10", "09:00", "10:00");

    env.cmd()
        .args(["jobs", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("delayed_achievement_check"));
}

#[test]
fn evaluate_without_data_unlocks_nothing() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["achievement", "evaluate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No new achievements."));
    env.cmd()
        .args(["achievement", "list", "--unlocked"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No achievements found."));
}

#[test]
fn manual_unlock_is_one_way() {
    let env = TestEnv::new();
    env.init();

    env.cmd()
        .args(["achievement", "unlock", "early_bird"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unlocked"));
    env.cmd()
        .args(["achievement", "unlock", "early_bird"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already unlocked"));
    env.cmd()
        .args(["achievement", "unlock", "no_such_thing"])
        .assert()
        .failure();
}

#[test]
fn db_maintenance_commands() {
    let env = TestEnv::new();
    env.init();
    env.add_block("Counted", "2025-03-10", "09:00", "10:00");

    env.cmd()
        .args(["db", "--info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-03-10"));
    env.cmd()
        .args(["db", "--check", "--vacuum"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Integrity check passed."))
        .stdout(predicate::str::contains("Vacuum completed."));
    env.cmd()
        .args(["db", "--migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 applied"));
}

#[test]
fn log_records_operations() {
    let env = TestEnv::new();
    env.init();
    env.add_block("Audited", "2025-03-10", "09:00", "10:00");

    env.cmd()
        .args(["log", "--print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"));
}

#[test]
fn backup_copies_and_compresses() {
    let env = TestEnv::new();
    env.init();
    let dest = env.other_db("backup/copy.sqlite");

    env.cmd()
        .args(["backup", "--force", "--file"])
        .arg(&dest)
        .assert()
        .success();
    assert!(dest.exists());

    let zipped = env.other_db("backup/packed.sqlite");
    env.cmd()
        .args(["backup", "--force", "--compress", "--file"])
        .arg(&zipped)
        .assert()
        .success();
    assert!(zipped.with_extension("zip").exists());
}

#[test]
fn config_check_and_migrate() {
    let env = TestEnv::new();
    env.cmd().arg("init").assert().success();

    let conf = env.home.join(".timeblocks").join("timeblocks.conf");
    assert!(conf.exists());
    fs::write(&conf, format!("database: {}\n", env.db.display())).unwrap();

    env.cmd()
        .args(["config", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sync_on_write"));
    env.cmd()
        .args(["config", "--migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added"));
    env.cmd()
        .args(["config", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file is complete."));

    env.cmd()
        .args(["config", "--print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("free_category_limit: 3"));
}

#[test]
fn sync_on_write_pushes_after_mutations() {
    let env = TestEnv::new();
    env.cmd().arg("init").assert().success();
    let conf = env.home.join(".timeblocks").join("timeblocks.conf");
    fs::write(
        &conf,
        format!("database: {}\nsync_on_write: true\n", env.db.display()),
    )
    .unwrap();

    env.sign_up("ada@example.com");
    env.add_block("Pushed right away", "2025-03-10", "09:00", "10:00");

    env.cmd()
        .args(["sync", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending   : 0 change(s)"));

    let users = env.remote.join("users");
    let uid_dir = fs::read_dir(&users).unwrap().next().unwrap().unwrap().path();
    let blocks = fs::read_dir(uid_dir.join("timeBlocks")).unwrap().count();
    assert_eq!(blocks, 1);
}
