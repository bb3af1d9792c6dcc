//! Sample generalizers and tables shared by unit tests

use crate::generalization::{Hierarchy, HierarchyGeneralizer, Node, PrefixGeneralizer, Suppressor};
use crate::model::{Column, Schema, Table};
use crate::partition::{Partition, Value};

/// Median-split hierarchy over 1..=9
///
/// ```text
/// Level 4: (1, 2, 3, 4, 5, 6, 7, 8, 9)
/// Level 3: (1, 2, 3, 4) (5, 6, 7, 8, 9)
/// Level 2: (1, 2) (3, 4) (5, 6) (7, 8, 9)
/// Level 1: (1) (2) (3) (4) (5) (6) (7) (8, 9)
/// Level 0: (1) (2) (3) (4) (5) (6) (7) (8) (9)
/// ```
pub fn int_generalizer() -> HierarchyGeneralizer {
    HierarchyGeneralizer::from_ints(1..=9).unwrap()
}

/// Level 2: all grades, level 1: A and B groups, level 0: single grades
pub fn grade_generalizer() -> HierarchyGeneralizer {
    let group = |grades: [&str; 3]| {
        Node::new(
            Partition::set(grades),
            grades.iter().map(|g| Node::leaf(Partition::set([*g]))).collect(),
        )
    };
    let hierarchy = Hierarchy::build(Node::new(
        Partition::set(["A+", "A", "A-", "B+", "B", "B-"]),
        vec![group(["A+", "A", "A-"]), group(["B+", "B", "B-"])],
    ))
    .unwrap();
    HierarchyGeneralizer::new(hierarchy)
}

fn int_schema(columns: usize) -> Schema {
    Schema::new(
        (1..=columns)
            .map(|i| Column::identifier(format!("Col{}", i), int_generalizer()))
            .collect(),
    )
}

/// Table with the given integer rows over the 1..=9 hierarchy
pub fn int_table(rows: &[&[i64]]) -> Table {
    let columns = rows.first().map_or(0, |r| r.len());
    let mut table = Table::new(int_schema(columns));
    for row in rows {
        table.add_row(row.iter().copied()).unwrap();
    }
    table
}

pub fn int_table_1() -> Table {
    int_table(&[&[1, 1, 1, 1], &[1, 1, 1, 2], &[4, 5, 1, 1], &[1, 3, 5, 7]])
}

pub fn student_table() -> Table {
    let mut table = Table::new(Schema::new(vec![
        Column::identifier("Gender", Suppressor),
        Column::identifier("Age", HierarchyGeneralizer::from_ints([25, 27, 28, 30]).unwrap()),
        Column::identifier("Year", HierarchyGeneralizer::from_ints([0, 1, 2]).unwrap()),
        Column::identifier(
            "Score",
            HierarchyGeneralizer::from_ints([10, 15, 30, 35, 40, 45]).unwrap(),
        ),
        Column::identifier("Grade", grade_generalizer()),
    ]));
    let rows: [(&str, i64, i64, i64, &str); 8] = [
        ("Male", 25, 0, 35, "A"),
        ("Female", 25, 0, 45, "A+"),
        ("Male", 30, 2, 30, "B"),
        ("Female", 30, 1, 35, "B+"),
        ("Male", 28, 1, 40, "A-"),
        ("Female", 28, 1, 15, "B"),
        ("Male", 27, 0, 15, "B-"),
        ("Female", 27, 2, 30, "B"),
    ];
    for (gender, age, year, score, grade) in rows {
        table
            .add_row([
                Value::from(gender),
                Value::from(age),
                Value::from(year),
                Value::from(score),
                Value::from(grade),
            ])
            .unwrap();
    }
    table
}

pub fn mixed_table() -> Table {
    let mut table = Table::new(Schema::new(vec![
        Column::identifier("Score", int_generalizer()),
        Column::identifier("Grade", grade_generalizer()),
        Column::identifier("Motto", PrefixGeneralizer::new(5)),
        Column::plain("Remark"),
    ]));
    let rows = [
        (9, "A+", "cats are wild", "data1"),
        (8, "A", "cats are evil", "data2"),
        (6, "A-", "cats are fluffy", "data3"),
        (5, "B-", "dogs are loyal", "data4"),
    ];
    for (score, grade, motto, remark) in rows {
        table
            .add_row([Value::from(score), Value::from(grade), Value::from(motto), Value::from(remark)])
            .unwrap();
    }
    table
}
