// ==========================================
// PSI 供需平衡引擎 - PSI 快照导出
// ==========================================
// 职责: 将全树两层缓冲区展开为逐批次行
// 顺序: 节点先序 -> 层 (demand, supply) -> 周 -> 桶 (S, CO, I, P) -> 插入顺序
// ==========================================

use crate::domain::calendar::CalendarIndex;
use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::records::SnapshotRow;
use crate::domain::tree::SupplyTree;
use crate::domain::types::{Bucket, Layer};

/// 生成 PSI 快照
///
/// # 返回
/// - `Err(HorizonMismatch)`: 树的规划期与日历长度不一致
pub fn psi_snapshot(tree: &SupplyTree, calendar: &CalendarIndex) -> PlanningResult<Vec<SnapshotRow>> {
    if tree.horizon() != calendar.len() {
        return Err(PlanningError::HorizonMismatch {
            expected: calendar.len(),
            actual: tree.horizon(),
        });
    }

    let mut rows = Vec::new();
    for id in tree.preorder() {
        let node = tree.node(id);
        for layer in Layer::ALL {
            let psi = node.psi(layer);
            for week in 0..psi.horizon() {
                let (iso_year, iso_week) = calendar.calendar_of(week)?;
                for bucket in Bucket::ALL {
                    for lot in psi.lots(week, bucket) {
                        rows.push(SnapshotRow {
                            product: tree.product().to_string(),
                            node: node.name.clone(),
                            layer,
                            bucket,
                            week_index: week,
                            iso_year,
                            iso_week,
                            lot_id: lot.to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lot::LotId;
    use crate::domain::records::TreeRow;

    #[test]
    fn test_rows_follow_canonical_order() {
        let rows = vec![TreeRow {
            parent_name: "root".into(),
            child_name: "leaf".into(),
            product_name: "P".into(),
            lead_time_weeks: 0,
            safety_stock_days: 0,
            lot_size: 1,
        }];
        let mut tree = SupplyTree::build("P", &rows).unwrap();
        let calendar = CalendarIndex::iso_weeks(2025, 10, 3).unwrap();
        tree.allocate(calendar.len());
        let leaf = tree.node_id("leaf").unwrap();
        let root = tree.root();
        tree.node_mut(leaf).psi_mut(Layer::Supply).insert(0, Bucket::Ship, LotId::new("s"));
        tree.node_mut(leaf).psi_mut(Layer::Demand).insert(2, Bucket::Arrival, LotId::new("p"));
        tree.node_mut(root).psi_mut(Layer::Demand).insert(1, Bucket::Inventory, LotId::new("i"));

        let snapshot = psi_snapshot(&tree, &calendar).unwrap();
        let keys: Vec<(&str, Layer, usize, Bucket, &str)> = snapshot
            .iter()
            .map(|r| (r.node.as_str(), r.layer, r.week_index, r.bucket, r.lot_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("root", Layer::Demand, 1, Bucket::Inventory, "i"),
                ("leaf", Layer::Demand, 2, Bucket::Arrival, "p"),
                ("leaf", Layer::Supply, 0, Bucket::Ship, "s"),
            ]
        );
        assert_eq!((snapshot[0].iso_year, snapshot[0].iso_week), (2025, 11));
    }

    #[test]
    fn test_horizon_mismatch_is_rejected() {
        let rows = vec![TreeRow {
            parent_name: "root".into(),
            child_name: "leaf".into(),
            product_name: "P".into(),
            lead_time_weeks: 0,
            safety_stock_days: 0,
            lot_size: 1,
        }];
        let mut tree = SupplyTree::build("P", &rows).unwrap();
        tree.allocate(4);
        let calendar = CalendarIndex::iso_weeks(2025, 1, 5).unwrap();
        assert!(matches!(
            psi_snapshot(&tree, &calendar),
            Err(PlanningError::HorizonMismatch { expected: 5, actual: 4 })
        ));
    }
}
