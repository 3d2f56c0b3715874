use super::*;
use crate::test_utils::*;
use sd_core::NodeKey;

fn users(with_email: bool) -> Snapshot {
    let mut f = Fixture::new();
    let mut columns = vec![("id", "int", false), ("name", "text", true)];
    if with_email {
        columns.push(("email", "text", true));
    }
    f.table("t1", &columns);
    f.build()
}

#[test]
fn test_added_column_is_single_alter() {
    let (old, new) = (users(false), users(true));
    let plan = plan_all(&old, &new).unwrap();
    assert_eq!(describe(&old, &new, &plan), vec!["ALTER COLUMN public.t1.email"]);
    assert_eq!(plan.actions[0].previous, None);
    assert_eq!(plan.count(ActionKind::Drop), 0);
    assert!(plan.diagnostics.is_empty());
}

#[test]
fn test_identical_snapshots_plan_nothing() {
    let (old, new) = (users(true), users(true));
    let plan = plan_all(&old, &new).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_empty_selection_plans_nothing() {
    let (old, new) = (users(false), users(true));
    let tree = tree(&old, &new);
    let plan = plan_selected(&old, &new, &tree, &Selection::new()).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_selected_child_pulls_in_added_parent() {
    let old = Fixture::new().build();
    let mut f = Fixture::new();
    f.table("t1", &[("id", "int", false)]);
    f.table("t2", &[("id", "int", false)]);
    let new = f.build();

    let tree = tree(&old, &new);
    let selection = Selection::new().with(ObjectKind::Column, "public.t1.id");
    let plan = plan_selected(&old, &new, &tree, &selection).unwrap();
    assert_eq!(describe(&old, &new, &plan), vec!["CREATE TABLE public.t1"]);
}

#[test]
fn test_selected_parent_covers_children() {
    let (old, new) = (users(false), users(true));
    let tree = tree(&old, &new);
    let mut selection = Selection::new();
    selection.insert(NodeKey::new(ObjectKind::Table, "public.t1"));
    let plan = plan_selected(&old, &new, &tree, &selection).unwrap();
    assert_eq!(plan.len(), 1);
}

#[test]
fn test_reordered_columns_recreate_table() {
    let mut f = Fixture::new();
    f.table("t1", &[("a", "int", true), ("b", "int", true)]);
    let old = f.build();
    let mut f = Fixture::new();
    f.table("t1", &[("b", "int", true), ("a", "int", true)]);
    let new = f.build();

    let plan = plan_all(&old, &new).unwrap();
    assert_eq!(
        describe(&old, &new, &plan),
        vec!["DROP TABLE public.t1", "CREATE TABLE public.t1"]
    );
    assert!(plan.actions[1].previous.is_some());
}

#[test]
fn test_reordered_columns_ignored_when_configured() {
    let mut f = Fixture::new();
    f.table("t1", &[("a", "int", true), ("b", "int", true)]);
    let old = f.build();
    let mut f = Fixture::new();
    f.table("t1", &[("b", "int", true), ("a", "int", true)]);
    let new = f.build();

    let options = DiffOptions {
        ignore_column_order: true,
    };
    let cancel = CancelFlag::new();
    let tree = sd_core::build_diff_tree(&old, &new, &options, &cancel).unwrap();
    let (old_graph, new_graph) = (graph(&old), graph(&new));
    let plan = Planner::new(&old, &new, &old_graph, &new_graph, options, &cancel)
        .plan(&tree, &Selection::all_changed(&tree))
        .unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_cancelled_before_start() {
    let (old, new) = (users(false), users(true));
    let tree = tree(&old, &new);
    let (old_graph, new_graph) = (graph(&old), graph(&new));
    let cancel = CancelFlag::new();
    cancel.cancel();
    let err = Planner::new(&old, &new, &old_graph, &new_graph, DiffOptions::default(), &cancel)
        .plan(&tree, &Selection::all_changed(&tree))
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn test_ranks_follow_plan_order() {
    let old = Fixture::new().build();
    let mut f = Fixture::new();
    f.table("t1", &[("id", "int", false)]);
    f.view("v1", "SELECT id FROM t1", &[(ObjectKind::Table, "t1")]);
    let new = f.build();

    let plan = plan_all(&old, &new).unwrap();
    let ranks: Vec<usize> = plan.actions.iter().map(|a| a.rank).collect();
    assert_eq!(ranks, (0..plan.len()).collect::<Vec<_>>());
}
