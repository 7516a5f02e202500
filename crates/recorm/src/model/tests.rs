use super::*;
use crate::builder::JoinOn;
use crate::error::OrmError;
use crate::mock::{MockConnection, MockResponse};
use crate::monitor::{QueryResult, StatementLog};
use crate::row;
use std::sync::{Arc, Mutex};

crate::model!(struct User);
crate::model!(struct BlogPost, id = "post_id");
crate::model!(struct Post);

fn session(conn: &MockConnection) -> (Session, StatementLog) {
    let log = StatementLog::new();
    (Session::new(conn.clone()).with_monitor(log.clone()), log)
}

#[test]
fn table_and_id_column_are_derived() {
    let session = Session::offline("mysql");
    let user = Record::<User>::new(&session);
    assert_eq!(user.table_name(), "`user`");
    assert_eq!(user.id_column(), "id_user");

    let post = Record::<BlogPost>::new(&session);
    assert_eq!(post.table_name(), "`blog_post`");
    assert_eq!(post.id_column(), "post_id");

    let pg = Record::<BlogPost>::new(&Session::offline("pgsql"));
    assert_eq!(pg.table_name(), "\"blog_post\"");
}

#[test]
fn fluent_calls_build_select() {
    let session = Session::offline("mysql");
    let mut user = Record::<User>::new(&session);
    user.select(["name"])
        .join::<Post>("inner", JoinOn::on("id_user", "=", "author"))
        .where_eq("name", "Ann")
        .order(["name"], "ASC")
        .limit(5);
    let built = user.to_select_sql().unwrap();
    assert_eq!(
        built.sql(),
        "SELECT `name` FROM `user` INNER JOIN `post` ON `user`.`id_user` = `post`.`author` \
         WHERE `name` = ? ORDER BY `name` ASC LIMIT 5"
    );
    assert_eq!(built.params(), &[Value::from("Ann")]);
}

#[test]
fn set_marks_dirty_and_create_with_does_not() {
    let session = Session::offline("mysql");
    let mut user = Record::<User>::new(&session);
    user.create_with(row! { "name" => "Ann" });
    assert!(user.is_new());
    assert!(!user.is_dirty());

    user.set("email", "ann@example.com");
    assert_eq!(user.get("email"), Some(&Value::from("ann@example.com")));
    assert_eq!(user.get("missing"), None);
    assert_eq!(user.dirty_fields().columns().collect::<Vec<_>>(), vec!["email"]);
}

#[test]
fn save_without_connection_fails_fast() {
    let session = Session::offline("mysql");
    let mut user = Record::<User>::new(&session);
    user.create().set("name", "Ann");
    assert!(matches!(user.save(), Err(OrmError::NoConnection)));
    assert!(user.is_new());
    assert!(user.is_dirty());
}

#[test]
fn save_clean_persisted_record_runs_nothing() {
    let conn = MockConnection::new("mysql");
    let (session, log) = session(&conn);
    let user = &mut Record::<User>::new(&session);
    user.save().unwrap();
    assert_eq!(conn.execution_count(), 0);
    assert!(log.is_empty());
}

#[test]
fn insert_assigns_generated_id_and_leaves_it_dirty() {
    let conn = MockConnection::new("mysql").with_next_id(42);
    let (session, log) = session(&conn);
    let mut user = Record::<User>::new(&session);
    user.create().set("name", "Ann").set("email", "ann@example.com");
    user.save().unwrap();

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].sql, "SELECT LAST_INSERT_ID()");
    assert_eq!(entries[1].result, QueryResult::Rows(1));
    assert_eq!(entries[1].tag.as_deref(), Some("User"));

    let entry = &entries[0];
    assert_eq!(entry.sql, "INSERT INTO `user` (`name`, `email`) VALUES (?, ?)");
    assert_eq!(
        entry.params,
        vec![Value::from("Ann"), Value::from("ann@example.com")]
    );
    assert_eq!(entry.tag.as_deref(), Some("User"));

    assert!(!user.is_new());
    assert_eq!(user.id(), Some(&Value::Int(42)));
    assert_eq!(
        user.dirty_fields().columns().collect::<Vec<_>>(),
        vec!["id_user"]
    );
}

#[test]
fn insert_keeps_explicit_id() {
    let conn = MockConnection::new("mysql");
    let (session, _log) = session(&conn);
    let mut user = Record::<User>::new(&session);
    user.create().set("id_user", 7).set("name", "Ann");
    user.save().unwrap();
    assert_eq!(user.id(), Some(&Value::Int(7)));
    assert!(!user.is_dirty());
}

#[test]
fn failed_id_read_after_insert_still_saves() {
    let conn = MockConnection::new("mysql");
    conn.fail_last_insert_id("lastval failed");
    let (session, log) = session(&conn);

    let mut user = Record::<User>::new(&session);
    user.create().set("name", "Ann");
    user.save().unwrap();

    assert!(!user.is_new());
    assert!(!user.is_dirty());
    assert_eq!(user.id(), None);
    assert_eq!(conn.execution_count(), 1);

    let errors = log.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].sql, "SELECT LAST_INSERT_ID()");
}

#[test]
fn update_sends_dirty_fields_then_id() {
    let conn = MockConnection::new("mysql");
    conn.push_rows(vec![row! { "id_user" => 3, "name" => "Ann", "age" => 30 }]);
    let (session, log) = session(&conn);

    let mut user = Record::<User>::new(&session);
    assert!(user.find_by_id(3).unwrap());
    user.set("age", 31).set("name", "Anne");
    user.save().unwrap();

    let entry = log.last().unwrap();
    assert_eq!(
        entry.sql,
        "UPDATE `user` SET `age` = ?, `name` = ? WHERE `user`.`id_user` = ?"
    );
    assert_eq!(
        entry.params,
        vec![Value::Int(31), Value::from("Anne"), Value::Int(3)]
    );
    assert!(!user.is_dirty());

    user.save().unwrap();
    assert_eq!(conn.execution_count(), 2);
}

#[test]
fn failed_save_is_logged_and_state_is_unchanged() {
    let conn = MockConnection::new("mysql");
    conn.push_error("Duplicate entry 'ann@example.com'");
    let (session, log) = session(&conn);

    let mut user = Record::<User>::new(&session);
    user.create().set("email", "ann@example.com");
    let err = user.save().unwrap_err();
    assert!(err.is_query_error());

    assert!(user.is_new());
    assert!(user.is_dirty());
    assert_eq!(user.id(), None);

    let errors = log.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].sql, "INSERT INTO `user` (`email`) VALUES (?)");
    assert_eq!(errors[0].params, vec![Value::from("ann@example.com")]);
}

#[test]
fn delete_issues_one_statement_and_keeps_dirty() {
    let conn = MockConnection::new("mysql");
    conn.push_rows(vec![row! { "id_user" => 5, "name" => "Ann" }]);
    let (session, log) = session(&conn);

    let mut user = Record::<User>::new(&session);
    user.find_by_id(5).unwrap();
    user.set("name", "changed");
    log.clear();

    assert_eq!(user.delete().unwrap(), 1);
    assert_eq!(log.len(), 1);
    let entry = log.last().unwrap();
    assert_eq!(entry.sql, "DELETE FROM `user` WHERE `id_user` = ?");
    assert_eq!(entry.params, vec![Value::Int(5)]);
    assert_eq!(entry.result, QueryResult::Affected(1));
    assert_eq!(
        user.dirty_fields().columns().collect::<Vec<_>>(),
        vec!["name"]
    );
    assert!(!user.is_new());
}

#[test]
fn find_one_caps_at_one_row_and_hydrates() {
    let conn = MockConnection::new("mysql");
    conn.push_rows(vec![row! { "id_user" => 1, "name" => "Ann" }]);
    let (session, log) = session(&conn);

    let mut user = Record::<User>::new(&session);
    user.where_eq("name", "Ann");
    assert!(user.find_one().unwrap());
    assert_eq!(
        log.last().unwrap().sql,
        "SELECT * FROM `user` WHERE `name` = ? LIMIT 1"
    );
    assert_eq!(user.get("name"), Some(&Value::from("Ann")));
    assert!(!user.is_new());
    assert!(!user.is_dirty());
}

#[test]
fn find_one_on_paged_query_keeps_the_offset() {
    let conn = MockConnection::new("pgsql");
    conn.push_rows(vec![row! { "id_user" => 6, "name" => "Fay" }]);
    let (session, log) = session(&conn);

    let mut user = Record::<User>::new(&session);
    user.order(["name"], "ASC").limit_with_offset(5, 10);
    assert_eq!(
        user.to_select_sql().unwrap().sql(),
        "SELECT * FROM \"user\" ORDER BY \"name\" ASC LIMIT 10 OFFSET 5"
    );

    assert!(user.find_one().unwrap());
    assert_eq!(
        log.last().unwrap().sql,
        "SELECT * FROM \"user\" ORDER BY \"name\" ASC LIMIT 1 OFFSET 5"
    );
    assert_eq!(user.id(), Some(&Value::Int(6)));
}

#[test]
fn find_one_without_rows_leaves_record_untouched() {
    let conn = MockConnection::new("mysql");
    let (session, _log) = session(&conn);
    let mut user = Record::<User>::new(&session);
    user.create_with(row! { "name" => "draft" });
    assert!(!user.find_by_id(99).unwrap());
    assert_eq!(user.get("name"), Some(&Value::from("draft")));
    assert!(user.is_new());
}

#[test]
fn find_many_returns_records_in_row_order() {
    let conn = MockConnection::new("mysql");
    conn.push_rows(vec![
        row! { "id_user" => 1, "name" => "Ann" },
        row! { "id_user" => 2, "name" => "Bob" },
    ]);
    let (session, _log) = session(&conn);

    let mut query = Record::<User>::new(&session);
    query.create().order(["name"], "ASC");
    let users = query.find_many().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id(), Some(&Value::Int(1)));
    assert_eq!(users[1].get("name"), Some(&Value::from("Bob")));
    for user in &users {
        assert!(!user.is_new());
        assert!(!user.is_dirty());
        assert_eq!(user.state(), query.state());
    }
}

#[test]
fn find_many_without_rows_is_empty() {
    let conn = MockConnection::new("mysql");
    let (session, _log) = session(&conn);
    assert!(Record::<User>::new(&session).find_many().unwrap().is_empty());
}

#[test]
fn failed_read_is_an_error_not_an_empty_result() {
    let conn = MockConnection::new("mysql");
    conn.push_error("no such table: user");
    let (session, log) = session(&conn);
    let err = Record::<User>::new(&session).find_many().unwrap_err();
    assert!(err.is_query_error());
    assert_eq!(log.errors().len(), 1);
}

#[test]
fn raw_query_replaces_assembly() {
    let conn = MockConnection::new("mysql");
    conn.push_rows(vec![row! { "total" => 3 }]);
    conn.push_rows(vec![row! { "total" => 4 }]);
    let (session, log) = session(&conn);

    let mut user = Record::<User>::new(&session);
    user.where_eq("ignored", 1);
    let rows = user
        .raw_query(
            "SELECT COUNT(*) AS total FROM `user` WHERE `age` > ?",
            vec![Value::Int(18)],
        )
        .unwrap();
    assert_eq!(rows[0].get("total"), Some(&Value::Int(3)));
    assert_eq!(log.last().unwrap().params, vec![Value::Int(18)]);

    // The override stays installed.
    let again = user.find_many().unwrap();
    assert_eq!(again[0].get("total"), Some(&Value::Int(4)));
    assert_eq!(
        log.last().unwrap().sql,
        "SELECT COUNT(*) AS total FROM `user` WHERE `age` > ?"
    );
}

#[test]
fn columns_loads_a_row_when_nothing_loaded() {
    let conn = MockConnection::new("mysql");
    conn.push_rows(vec![row! { "id_user" => 1, "name" => "Ann", "email" => "a@b.c" }]);
    let (session, log) = session(&conn);

    let mut user = Record::<User>::new(&session);
    assert_eq!(user.columns().unwrap(), vec!["id_user", "name", "email"]);
    assert_eq!(log.len(), 1);
    assert_eq!(user.columns().unwrap().len(), 3);
    assert_eq!(log.len(), 1);
}

#[test]
fn invalid_join_is_reported_on_read() {
    let conn = MockConnection::new("mysql");
    let (session, _log) = session(&conn);
    let mut user = Record::<User>::new(&session);
    user.join::<Post>("inner", JoinOn::on("a", "=", "b").and("c", "=", "d"));
    assert!(matches!(user.find_many(), Err(OrmError::Validation(_))));
    assert_eq!(conn.execution_count(), 0);
}

#[test]
fn decode_into_struct() {
    #[derive(Debug, PartialEq)]
    struct Account {
        id: i64,
        name: String,
    }

    impl FromRow for Account {
        fn from_row(row: &Row) -> OrmResult<Self> {
            Ok(Self {
                id: row.try_get("id_user")?,
                name: row.try_get("name")?,
            })
        }
    }

    let conn = MockConnection::new("mysql");
    conn.push_rows(vec![row! { "id_user" => 9, "name" => "Ann" }]);
    let (session, _log) = session(&conn);
    let mut user = Record::<User>::new(&session);
    user.find_by_id(9).unwrap();
    assert_eq!(
        user.decode::<Account>().unwrap(),
        Account {
            id: 9,
            name: "Ann".into()
        }
    );
}

#[test]
fn insert_then_find_round_trips() {
    let table: Arc<Mutex<Vec<Row>>> = Arc::default();
    let store = Arc::clone(&table);
    let conn = MockConnection::new("mysql").with_responder(move |sql, params| {
        let mut rows = store.lock().unwrap();
        if sql.starts_with("INSERT") {
            let open = sql.find('(')?;
            let close = sql.find(')')?;
            let mut row: Row = sql[open + 1..close]
                .split(", ")
                .map(|c| c.trim_matches('`').to_string())
                .zip(params.iter().cloned())
                .collect();
            row.insert("id_user", rows.len() as i64 + 1);
            rows.push(row);
            return Some(MockResponse::Affected(1));
        }
        if sql.starts_with("SELECT") {
            let id = params.last()?.as_i64()?;
            let found = rows
                .iter()
                .filter(|r| r.get("id_user") == Some(&Value::Int(id)))
                .cloned()
                .collect();
            return Some(MockResponse::Rows(found));
        }
        None
    });
    let (session, _log) = session(&conn);

    let mut user = Record::<User>::new(&session);
    user.create()
        .set("name", "Ann")
        .set("email", "ann@example.com");
    user.save().unwrap();
    let id = user.id().cloned().unwrap();

    let mut found = Record::<User>::new(&session);
    assert!(found.find_by_id(id).unwrap());
    assert_eq!(found.fields(), user.fields());
}
