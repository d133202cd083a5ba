//! Library-level checks of the core guarantees, on in-memory databases.

use chrono::{Duration, NaiveDate, NaiveTime};
use timeblocks::core::achievements::AchievementLogic;
use timeblocks::core::blocks::{BlockLogic, NewBlock};
use timeblocks::core::categories::CategoryLogic;
use timeblocks::core::statistics::StatisticsLogic;
use timeblocks::core::user::UserLogic;
use timeblocks::db::pool::DbPool;
use timeblocks::db::time_blocks::watch_blocks_for_date;
use timeblocks::errors::AppError;
use timeblocks::models::user::{MAX_CATEGORIES_FREE, MAX_CATEGORIES_PREMIUM};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn pool() -> DbPool {
    let mut pool = DbPool::open_in_memory().unwrap();
    CategoryLogic::seed_defaults(&mut pool).unwrap();
    AchievementLogic::seed(&mut pool).unwrap();
    pool
}

fn plan(pool: &mut DbPool, title: &str, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> String {
    BlockLogic::create(
        pool,
        NewBlock {
            title: title.into(),
            description: None,
            start,
            end,
            category_id: "cat_work".into(),
            date,
        },
    )
    .unwrap()
    .id
}

/// Log `hours` of completed work as one block per day starting at `first`.
fn log_hours(pool: &mut DbPool, first: NaiveDate, days: i64, hours_per_day: u32) {
    for i in 0..days {
        let date = first + Duration::days(i);
        let id = plan(pool, "work", date, t(9, 0), t(9 + hours_per_day, 0));
        BlockLogic::start(pool, &id, t(9, 0)).unwrap();
        BlockLogic::complete(pool, &id, t(9 + hours_per_day, 0)).unwrap();
    }
}

#[test]
fn start_must_precede_end() {
    let mut pool = pool();
    for (s, e) in [(t(10, 0), t(9, 0)), (t(10, 0), t(10, 0))] {
        let res = BlockLogic::create(
            &mut pool,
            NewBlock {
                title: "bad".into(),
                description: None,
                start: s,
                end: e,
                category_id: "cat_work".into(),
                date: d("2025-03-10"),
            },
        );
        assert!(matches!(res, Err(AppError::Validation(_))));
    }
    assert!(BlockLogic::daily(&pool, d("2025-03-10")).unwrap().is_empty());
}

#[test]
fn total_hours_ignore_blocks_missing_a_timestamp() {
    let mut pool = pool();
    let day = d("2025-03-10");

    let done = plan(&mut pool, "done", day, t(9, 0), t(10, 0));
    BlockLogic::start(&mut pool, &done, t(9, 0)).unwrap();
    BlockLogic::complete(&mut pool, &done, t(10, 30)).unwrap();

    let running = plan(&mut pool, "running", day, t(11, 0), t(12, 0));
    BlockLogic::start(&mut pool, &running, t(11, 0)).unwrap();

    plan(&mut pool, "planned", day, t(13, 0), t(14, 0));

    let stats = StatisticsLogic::for_range(&pool.conn, day, day).unwrap();
    assert!((stats.total_hours - 1.5).abs() < 1e-9);
    assert_eq!(stats.completed_blocks, 1);
}

#[test]
fn unlocked_achievement_never_reverts() {
    let mut pool = pool();
    assert!(AchievementLogic::unlock(&mut pool, "night_owl", 1_000).unwrap());
    assert!(!AchievementLogic::unlock(&mut pool, "night_owl", 2_000).unwrap());

    // A later evaluation with no supporting data keeps it unlocked.
    AchievementLogic::evaluate(&mut pool, d("2025-03-10"), 3_000).unwrap();
    let a = AchievementLogic::get(&pool, "night_owl").unwrap();
    assert!(a.is_unlocked);
    assert_eq!(a.unlocked_at, Some(1_000));

    let relock = pool
        .conn
        .execute("UPDATE achievements SET is_unlocked = 0 WHERE id = 'night_owl'", []);
    assert!(relock.is_err());
}

#[test]
fn category_creation_stops_at_tier_limit() {
    // Without the seeded defaults: three fit, the fourth is refused.
    let mut bare = DbPool::open_in_memory().unwrap();
    UserLogic::initialize(&mut bare, "u1", "en").unwrap();
    let limit = UserLogic::category_limit(&bare, Some("u1"), MAX_CATEGORIES_FREE).unwrap();
    assert_eq!(limit, MAX_CATEGORIES_FREE);
    for i in 0..limit {
        CategoryLogic::create(&mut bare, &format!("custom {i}"), "#123456", "", limit).unwrap();
    }
    assert!(!CategoryLogic::can_create(&bare, limit).unwrap());
    assert!(matches!(
        CategoryLogic::create(&mut bare, "one more", "#123456", "", limit),
        Err(AppError::CategoryLimit { limit: 3 })
    ));

    // The defaults count too, so a seeded free store is already full.
    let mut pool = pool();
    UserLogic::initialize(&mut pool, "u1", "en").unwrap();
    assert_eq!(CategoryLogic::list(&pool).unwrap().len(), 6);
    assert!(matches!(
        CategoryLogic::create(&mut pool, "one more", "#123456", "", limit),
        Err(AppError::CategoryLimit { limit: 3 })
    ));

    UserLogic::set_premium(&mut pool, "u1", true).unwrap();
    let limit = UserLogic::category_limit(&pool, Some("u1"), MAX_CATEGORIES_FREE).unwrap();
    assert_eq!(limit, MAX_CATEGORIES_PREMIUM);
    CategoryLogic::create(&mut pool, "one more", "#123456", "", limit).unwrap();
}

#[test]
fn created_block_shows_up_in_daily_query_sorted() {
    let mut pool = pool();
    let today = timeblocks::utils::date::today();

    plan(&mut pool, "later", today, t(11, 0), t(12, 0));
    plan(&mut pool, "first", today, t(9, 0), t(10, 0));

    let blocks = BlockLogic::daily(&pool, today).unwrap();
    let titles: Vec<_> = blocks.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["first", "later"]);
    assert_eq!(blocks[0].category_id, "cat_work");
    assert_eq!(blocks[0].start_time, t(9, 0));
    assert_eq!(blocks[0].end_time, t(10, 0));
}

#[test]
fn fifty_hours_unlock_only_the_first_tier() {
    let mut pool = pool();
    log_hours(&mut pool, d("2025-01-01"), 10, 5);

    let unlocked = AchievementLogic::evaluate(&mut pool, d("2025-03-31"), 1).unwrap();
    assert!(unlocked.contains(&"hours_50".to_string()));
    assert!(!unlocked.contains(&"hours_200".to_string()));
    assert!(!unlocked.contains(&"hours_1000".to_string()));

    let hours_200 = AchievementLogic::get(&pool, "hours_200").unwrap();
    assert_eq!(hours_200.progress, 50);
}

#[test]
fn forty_nine_hours_unlock_nothing() {
    let mut pool = pool();
    log_hours(&mut pool, d("2025-01-01"), 7, 7);

    let unlocked = AchievementLogic::evaluate(&mut pool, d("2025-03-31"), 1).unwrap();
    assert!(!unlocked.iter().any(|id| id.starts_with("hours_")));
}

#[test]
fn two_hundred_hours_unlock_the_second_tier() {
    let mut pool = pool();
    log_hours(&mut pool, d("2025-01-01"), 25, 8);

    let unlocked = AchievementLogic::evaluate(&mut pool, d("2025-03-31"), 1).unwrap();
    assert!(unlocked.contains(&"hours_50".to_string()));
    assert!(unlocked.contains(&"hours_200".to_string()));
    assert!(!unlocked.contains(&"hours_1000".to_string()));
}

#[test]
fn deleted_block_leaves_both_queries_and_notifies_watchers() {
    let mut pool = pool();
    let day = d("2025-03-10");
    let id = plan(&mut pool, "gone", day, t(9, 0), t(10, 0));

    let live = watch_blocks_for_date(&pool, day);
    assert_eq!(live.current(&pool).unwrap().len(), 1);

    BlockLogic::delete(&mut pool, &id).unwrap();

    let snapshot = live.poll(&pool).unwrap().expect("change notified");
    assert!(snapshot.is_empty());
    assert!(live.poll(&pool).unwrap().is_none());
    assert!(BlockLogic::daily(&pool, day).unwrap().is_empty());
    assert!(BlockLogic::range(&pool, day, day).unwrap().is_empty());
}
