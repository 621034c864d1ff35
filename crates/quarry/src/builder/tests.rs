use super::*;
use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::{DbError, DbResult};
use crate::params;
use crate::params::Params;
use crate::record::{FromRow, Record};
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Default)]
struct RecordingDriver {
    calls: RefCell<Vec<(String, Params)>>,
    responses: RefCell<VecDeque<Vec<Record>>>,
    insert_ids: Vec<(String, i64)>,
    id_lookups: RefCell<Vec<String>>,
}

impl RecordingDriver {
    fn respond(self, rows: Vec<Record>) -> Self {
        self.responses.borrow_mut().push_back(rows);
        self
    }

    fn with_insert_id(mut self, table: &str, id: i64) -> Self {
        self.insert_ids.push((table.to_string(), id));
        self
    }

    fn sql(&self, i: usize) -> String {
        self.calls.borrow()[i].0.clone()
    }

    fn params(&self, i: usize) -> Params {
        self.calls.borrow()[i].1.clone()
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Driver for RecordingDriver {
    fn query(&self, sql: &str, params: &Params) -> DbResult<Vec<Record>> {
        self.calls
            .borrow_mut()
            .push((sql.to_string(), params.clone()));
        Ok(self.responses.borrow_mut().pop_front().unwrap_or_default())
    }

    fn execute(&self, sql: &str, params: &Params) -> DbResult<u64> {
        self.calls
            .borrow_mut()
            .push((sql.to_string(), params.clone()));
        Ok(0)
    }

    fn last_insert_id(&self, table: &str) -> DbResult<Option<i64>> {
        self.id_lookups.borrow_mut().push(table.to_string());
        Ok(self
            .insert_ids
            .iter()
            .find(|(t, _)| t == table)
            .map(|&(_, id)| id))
    }
}

fn conn() -> Connection<RecordingDriver> {
    Connection::new(RecordingDriver::default())
}

fn count_row(n: i64) -> Record {
    Record::new().with("count", n)
}

#[test]
fn defaults_to_select_star() {
    let c = conn();
    assert_eq!(c.table("users").to_sql(), "select * from users");
}

#[test]
fn renders_every_clause_in_order() {
    let c = conn();
    let sql = c
        .table("users")
        .select(["users.id", "name"])
        .inner_join("posts on posts.user_id = users.id")
        .left_join("teams on teams.id = users.team_id")
        .and_where("age > :age", params! { "age" => 18 })
        .or_where("admin = :admin", params! { "admin" => true })
        .group_by("users.id")
        .group_by("name")
        .order_by_desc("users.id")
        .order_by_asc("name")
        .limit(10)
        .offset(20)
        .to_sql();

    assert_eq!(
        sql,
        "select users.id, name from users \
         inner join posts on posts.user_id = users.id \
         left join teams on teams.id = users.team_id \
         where age > :age or admin = :admin \
         group by users.id, name \
         order by users.id desc, name asc \
         limit 10 offset 20"
    );
}

#[test]
fn first_where_joiner_is_dropped() {
    let c = conn();
    let sql = c
        .table("t")
        .or_where("a = 1", Params::new())
        .and_where("b = 2", Params::new())
        .to_sql();
    assert_eq!(sql, "select * from t where a = 1 and b = 2");
}

#[test]
fn cross_join_and_empty_select() {
    let c = conn();
    let sql = c
        .table("a")
        .select(Vec::<&str>::new())
        .cross_join("b")
        .to_sql();
    assert_eq!(sql, "select * from a cross join b");
}

#[test]
fn zero_limit_and_offset_are_omitted() {
    let c = conn();
    assert_eq!(c.table("t").limit(0).offset(0).to_sql(), "select * from t");
    assert_eq!(c.table("t").limit(5).offset(0).to_sql(), "select * from t limit 5");
    assert_eq!(c.table("t").offset(3).to_sql(), "select * from t offset 3");
}

#[test]
fn where_params_accumulate() {
    let c = conn();
    let q = c
        .table("t")
        .and_where("a = :a", params! { "a" => 1 })
        .and_where("b = :b", params! { ":b" => 2 })
        .bind("c", "x");
    let keys: Vec<&str> = q.params().keys().collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
}

#[test]
fn insert_sql_follows_attribute_order() {
    let c = conn();
    let sql = c
        .table("users")
        .insert_sql(&params! { "name" => "a", "age" => 1 });
    assert_eq!(sql, "insert into users (name, age) values (:name, :age)");
}

#[test]
fn update_sql_and_param_merge() {
    let c = conn();
    let q = c.table("users").and_where("id = :id", params! { "id" => 1 });
    let attrs = params! { "name" => "bob", "id" => 2 };

    assert_eq!(
        q.update_sql(&attrs),
        "update users set name = :name, id = :id where id = :id"
    );

    let merged = q.update_params(&attrs);
    assert_eq!(merged.get("id"), Some(&crate::Value::Int(2)));
    assert_eq!(merged.get("name"), Some(&crate::Value::from("bob")));
}

#[test]
fn update_executes_with_merged_params() {
    let c = conn();
    let ok = c
        .table("users")
        .and_where("id = :id", params! { "id" => 7 })
        .update(&params! { "name" => "x" })
        .unwrap();
    assert!(ok);

    let d = c.driver();
    assert_eq!(d.sql(0), "update users set name = :name where id = :id");
    let sent = d.params(0);
    assert_eq!(sent.get("id"), Some(&crate::Value::Int(7)));
    assert_eq!(sent.get("name"), Some(&crate::Value::from("x")));
}

#[test]
fn delete_sql_with_and_without_where() {
    let c = conn();
    assert_eq!(c.table("t").delete_sql(), "delete from t");
    assert_eq!(
        c.table("t")
            .and_where("id = :id", params! { "id" => 1 })
            .order_by_asc("id")
            .limit(1)
            .delete_sql(),
        "delete from t where id = :id order by id asc limit 1"
    );
}

#[test]
fn count_reads_aggregate_column() {
    let c = Connection::new(RecordingDriver::default().respond(vec![count_row(5)]));
    let q = c.table("users").and_where("age > :age", params! { "age" => 3 });
    let before = q.to_sql();

    assert_eq!(q.count().unwrap(), 5);
    assert_eq!(
        c.driver().sql(0),
        "select count(*) count from users where age > :age"
    );
    assert_eq!(q.to_sql(), before);
}

#[test]
fn count_with_group_by_counts_groups() {
    let rows = vec![count_row(2), count_row(1), count_row(4)];
    let c = Connection::new(RecordingDriver::default().respond(rows));
    let n = c.table("users").group_by("team_id").count().unwrap();
    assert_eq!(n, 3);
    assert_eq!(
        c.driver().sql(0),
        "select count(*) count from users group by team_id"
    );
}

#[test]
fn count_on_no_rows_is_zero() {
    let c = conn();
    assert_eq!(c.table("t").count().unwrap(), 0);
}

#[test]
fn clone_for_count_keeps_filters_only() {
    let c = conn();
    let q = c
        .table("users")
        .select(["id"])
        .inner_join("teams on teams.id = users.team_id")
        .and_where("a = :a", params! { "a" => 1 })
        .group_by("team_id")
        .order_by_desc("id")
        .limit(2)
        .offset(4);

    let counted = q.clone_for_count();
    assert_eq!(
        counted.to_sql(),
        "select * from users inner join teams on teams.id = users.team_id \
         where a = :a group by team_id"
    );
    assert_eq!(counted.params().len(), 1);
    // the source builder is untouched
    assert!(q.to_sql().ends_with("order by id desc limit 2 offset 4"));
}

#[test]
fn paginate_second_page_of_five() {
    let page_rows = vec![Record::new().with("id", 3i64), Record::new().with("id", 4i64)];
    let driver = RecordingDriver::default()
        .respond(page_rows)
        .respond(vec![count_row(5)]);
    let c = Connection::new(driver);

    let page = c
        .table("users")
        .order_by_asc("id")
        .paginate(2, 2u64)
        .unwrap();

    let d = c.driver();
    assert_eq!(d.call_count(), 2);
    assert_eq!(d.sql(0), "select * from users order by id asc limit 2 offset 2");
    assert_eq!(d.sql(1), "select count(*) count from users");

    assert_eq!(page.total(), 5);
    assert_eq!(page.last_page(), 3);
    assert_eq!(page.current_page(), 2);
    assert_eq!(page.items().len(), 2);
    assert!(!page.on_first_page());
    assert!(page.has_more_pages());
    assert_eq!(page.page_name(), "page");
}

#[test]
fn paginate_walks_all_pages() {
    for (page_no, more) in [(1u64, true), (2, true), (3, false)] {
        let driver = RecordingDriver::default()
            .respond(vec![Record::new()])
            .respond(vec![count_row(5)]);
        let c = Connection::new(driver);
        let page = c
            .table("users")
            .paginate(2, crate::PageRequest::named("p", page_no))
            .unwrap();
        assert_eq!(page.has_more_pages(), more);
        assert_eq!(page.on_first_page(), page_no == 1);
        assert_eq!(page.page_name(), "p");
    }
}

#[test]
fn paginate_rejects_zero_per_page() {
    let c = conn();
    let err = c.table("users").paginate(0, 1u64).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(c.driver().call_count(), 0);
}

#[test]
fn insert_get_id_returns_generated_id() {
    let c = Connection::new(RecordingDriver::default().with_insert_id("users", 42));
    let id = c
        .table("users")
        .insert_get_id(&params! { "name" => "a", "age" => 1 })
        .unwrap();
    assert_eq!(id, 42);
    assert_eq!(
        c.driver().sql(0),
        "insert into users (name, age) values (:name, :age)"
    );
}

#[test]
fn insert_get_id_only_reports_the_target_tables_id() {
    let c = Connection::new(RecordingDriver::default().with_insert_id("users", 1));
    let id = c
        .table("users")
        .insert_get_id(&params! { "name" => "a" })
        .unwrap();
    assert_eq!(id, 1);

    let err = c
        .table("notes")
        .insert_get_id(&params! { "body" => "hi" })
        .unwrap_err();
    assert!(matches!(err, DbError::NoInsertId));
    assert_eq!(*c.driver().id_lookups.borrow(), ["users", "notes"]);
}

#[test]
fn insert_get_id_without_id_is_error() {
    let c = conn();
    let err = c
        .table("logs")
        .insert_get_id(&params! { "msg" => "hi" })
        .unwrap_err();
    assert!(matches!(err, DbError::NoInsertId));
}

#[test]
fn insert_ignores_where_params() {
    let c = conn();
    c.table("t")
        .and_where("id = :id", params! { "id" => 1 })
        .insert(&params! { "name" => "a" })
        .unwrap();
    let sent = c.driver().params(0);
    assert_eq!(sent.len(), 1);
    assert!(sent.contains_key("name"));
}

#[test]
fn empty_attributes_and_missing_table_are_rejected() {
    let c = conn();
    assert!(c.table("t").insert(&Params::new()).unwrap_err().is_validation());
    assert!(c.table("t").update(&Params::new()).unwrap_err().is_validation());
    assert!(c.query().get().unwrap_err().is_validation());
    assert!(c.table("  ").count().unwrap_err().is_validation());
    assert_eq!(c.driver().call_count(), 0);
}

#[derive(Debug, PartialEq)]
struct User {
    id: i64,
    name: String,
}

impl FromRow for User {
    fn from_row(row: &Record) -> DbResult<Self> {
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

#[test]
fn maps_rows_into_requested_shape() {
    let row = Record::new().with("id", 1i64).with("name", "ann");
    let c = Connection::new(RecordingDriver::default().respond(vec![row]));
    let first = c
        .table("users")
        .as_instances_of::<User>()
        .first()
        .unwrap();
    assert_eq!(
        first,
        Some(User {
            id: 1,
            name: "ann".into()
        })
    );
}

#[test]
fn shape_mismatch_is_decode_error() {
    let row = Record::new().with("id", "not a number").with("name", "ann");
    let c = Connection::new(RecordingDriver::default().respond(vec![row]));
    let err = c.table("users").as_instances_of::<User>().get().unwrap_err();
    assert!(matches!(err, DbError::Decode { .. }));
}

#[test]
fn sort_dir_parses_any_case() {
    assert_eq!("DESC".parse::<SortDir>().unwrap(), SortDir::Desc);
    assert_eq!("asc".parse::<SortDir>().unwrap(), SortDir::Asc);
    assert!("up".parse::<SortDir>().is_err());
}
