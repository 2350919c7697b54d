//! Input and output tables of standard SQL statements

use sqlparser::ast::{
    CreateTable, Insert, ObjectName, ObjectNamePart, ObjectType, Query, SetExpr, Statement,
    TableFactor, TableObject, TableWithJoins,
};

/// Tables a statement reads and writes, in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRefs {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// Dotted name with identifier quotes removed, so `` `db`.`t` `` and
/// `db.t` name the same table
fn table_name(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|part| match part {
            ObjectNamePart::Identifier(ident) => ident.value.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Collect the tables read and written by `statement`.
///
/// Queries contribute the base tables reached through FROM and JOIN,
/// including subqueries, set operations and CTE bodies. CREATE TABLE,
/// INSERT and DROP TABLE contribute their targets as outputs.
pub fn extract_tables(statement: &Statement) -> TableRefs {
    let mut refs = TableRefs::default();

    match statement {
        Statement::Query(query) => collect_query(query, &[], &mut refs.inputs),
        Statement::CreateTable(CreateTable { name, query, .. }) => {
            if let Some(query) = query {
                collect_query(query, &[], &mut refs.inputs);
            }
            push_unique(&mut refs.outputs, table_name(name));
        }
        Statement::Insert(Insert { table, source, .. }) => {
            if let Some(source) = source {
                collect_query(source, &[], &mut refs.inputs);
            }
            if let TableObject::TableName(name) = table {
                push_unique(&mut refs.outputs, table_name(name));
            }
        }
        Statement::Drop {
            object_type: ObjectType::Table,
            names,
            ..
        } => {
            for name in names {
                push_unique(&mut refs.outputs, table_name(name));
            }
        }
        _ => {}
    }

    refs
}

/// Tables read by a query. `outer_ctes` are CTE names visible from
/// enclosing queries.
fn collect_query(query: &Query, outer_ctes: &[String], inputs: &mut Vec<String>) {
    let mut ctes = outer_ctes.to_vec();
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            collect_query(&cte.query, &ctes, inputs);
            ctes.push(cte.alias.name.value.clone());
        }
    }
    collect_set_expr(&query.body, &ctes, inputs);
}

fn collect_set_expr(body: &SetExpr, ctes: &[String], inputs: &mut Vec<String>) {
    match body {
        SetExpr::Select(select) => {
            for table in &select.from {
                collect_table_with_joins(table, ctes, inputs);
            }
        }
        SetExpr::Query(query) => collect_query(query, ctes, inputs),
        SetExpr::SetOperation { left, right, .. } => {
            collect_set_expr(left, ctes, inputs);
            collect_set_expr(right, ctes, inputs);
        }
        _ => {}
    }
}

fn collect_table_with_joins(table: &TableWithJoins, ctes: &[String], inputs: &mut Vec<String>) {
    collect_table_factor(&table.relation, ctes, inputs);
    for join in &table.joins {
        collect_table_factor(&join.relation, ctes, inputs);
    }
}

fn collect_table_factor(factor: &TableFactor, ctes: &[String], inputs: &mut Vec<String>) {
    match factor {
        TableFactor::Table { name, .. } => {
            let name = table_name(name);
            if !ctes.contains(&name) {
                push_unique(inputs, name);
            }
        }
        TableFactor::Derived { subquery, .. } => collect_query(subquery, ctes, inputs),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => collect_table_with_joins(table_with_joins, ctes, inputs),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::MySqlDialect;
    use sqlparser::parser::Parser;

    fn refs(sql: &str) -> TableRefs {
        let statements = Parser::parse_sql(&MySqlDialect {}, sql).unwrap();
        extract_tables(&statements[0])
    }

    #[test]
    fn select_with_join_and_subquery() {
        let r = refs("SELECT * FROM a JOIN b ON a.id = b.id, (SELECT * FROM db.c) x");
        assert_eq!(r.inputs, vec!["a", "b", "db.c"]);
        assert!(r.outputs.is_empty());
    }

    #[test]
    fn cte_names_are_not_inputs() {
        let r = refs("WITH t AS (SELECT * FROM src) SELECT * FROM t");
        assert_eq!(r.inputs, vec!["src"]);
    }

    #[test]
    fn create_insert_drop() {
        let r = refs("CREATE TABLE a AS SELECT * FROM s");
        assert_eq!(r.inputs, vec!["s"]);
        assert_eq!(r.outputs, vec!["a"]);

        let r = refs("INSERT INTO t2 SELECT * FROM t1 UNION SELECT * FROM t3");
        assert_eq!(r.inputs, vec!["t1", "t3"]);
        assert_eq!(r.outputs, vec!["t2"]);

        let r = refs("DROP TABLE IF EXISTS x, y");
        assert_eq!(r.outputs, vec!["x", "y"]);
    }

    #[test]
    fn quoted_names_are_unquoted() {
        let r = refs("INSERT INTO `db`.`out` SELECT * FROM `db`.src, `t`");
        assert_eq!(r.inputs, vec!["db.src", "t"]);
        assert_eq!(r.outputs, vec!["db.out"]);
    }
}
