//! Live round-trip tests against Postgres.
//!
//! Skipped unless `DATABASE_URL` is set (a `.env` file is honored).

#![cfg(feature = "postgres")]

use recorm::{
    ConnectionConfig, JoinOn, OrmResult, Record, Session, StatementLog, Value, model,
};

model!(struct RecormItem);
model!(struct RecormTag);

fn try_connect() -> OrmResult<Option<(Session, StatementLog)>> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL is not set; skipping");
        return Ok(None);
    }

    let log = StatementLog::new();
    let session = Session::connect(&ConnectionConfig::from_env()?)?.with_monitor(log.clone());
    session.execute(
        "CREATE TEMP TABLE recorm_item (\
            id_recorm_item BIGSERIAL PRIMARY KEY, \
            name TEXT NOT NULL UNIQUE, \
            qty INT)",
        &[],
    )?;
    session.execute(
        "CREATE TEMP TABLE recorm_tag (\
            id_recorm_tag BIGSERIAL PRIMARY KEY, \
            item BIGINT NOT NULL, \
            label TEXT NOT NULL)",
        &[],
    )?;
    Ok(Some((session, log)))
}

fn insert(session: &Session, name: &str, qty: i32) -> OrmResult<Record<RecormItem>> {
    let mut item = Record::<RecormItem>::new(session);
    item.create().set("name", name).set("qty", qty);
    item.save()?;
    Ok(item)
}

#[test]
fn insert_then_find_round_trips() -> OrmResult<()> {
    let Some((session, _log)) = try_connect()? else {
        return Ok(());
    };
    assert_eq!(session.driver_name(), "pgsql");

    let item = insert(&session, "widget", 3)?;
    let id = item.id().cloned().unwrap_or(Value::Null);
    assert!(matches!(id, Value::Int(_)));

    let mut found = Record::<RecormItem>::new(&session);
    assert!(found.find_by_id(id)?);
    assert_eq!(found.fields(), item.fields());
    Ok(())
}

#[test]
fn update_and_delete() -> OrmResult<()> {
    let Some((session, log)) = try_connect()? else {
        return Ok(());
    };

    let mut item = insert(&session, "gadget", 1)?;
    let id = item.id().cloned().unwrap_or(Value::Null);

    item.set("qty", 5);
    item.save()?;
    assert!(log
        .statements()
        .iter()
        .any(|sql| sql.starts_with("UPDATE \"recorm_item\" SET")));

    let mut reloaded = Record::<RecormItem>::new(&session);
    reloaded.find_by_id(id.clone())?;
    assert_eq!(reloaded.get("qty"), Some(&Value::Int(5)));

    assert_eq!(item.delete()?, 1);
    let mut gone = Record::<RecormItem>::new(&session);
    assert!(!gone.find_by_id(id)?);
    Ok(())
}

#[test]
fn find_many_with_where_order_and_join() -> OrmResult<()> {
    let Some((session, _log)) = try_connect()? else {
        return Ok(());
    };

    let a = insert(&session, "a", 1)?;
    insert(&session, "b", 2)?;
    insert(&session, "c", 3)?;

    let mut query = Record::<RecormItem>::new(&session);
    query
        .and_where("qty", "IN", vec![1, 3])
        .order(["name"], "DESC");
    let names: Vec<Option<Value>> = query
        .find_many()?
        .iter()
        .map(|r| r.get("name").cloned())
        .collect();
    assert_eq!(names, vec![Some(Value::from("c")), Some(Value::from("a"))]);

    let mut tag = Record::<RecormTag>::new(&session);
    tag.create()
        .set("item", a.id().cloned().unwrap_or(Value::Null))
        .set("label", "first");
    tag.save()?;

    let mut joined = Record::<RecormItem>::new(&session);
    joined
        .select(["recorm_item.name", "recorm_tag.label"])
        .join::<RecormTag>("inner", JoinOn::on("id_recorm_item", "=", "item"));
    let rows = joined.find_many()?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("label"), Some(&Value::from("first")));
    Ok(())
}

#[test]
fn raw_query_and_unique_violation() -> OrmResult<()> {
    let Some((session, log)) = try_connect()? else {
        return Ok(());
    };

    insert(&session, "dup", 1)?;
    let err = insert(&session, "dup", 2).unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(log.errors().len(), 1);

    let rows = Record::<RecormItem>::new(&session).raw_query(
        "SELECT COUNT(*) AS total FROM recorm_item WHERE qty >= ?",
        vec![Value::Int(1)],
    )?;
    assert_eq!(rows[0].get("total"), Some(&Value::Int(1)));
    Ok(())
}
