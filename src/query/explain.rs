//! Human-readable description of a frozen query
//!
//! Output is deterministic: the same plan always renders the same text.

use std::fmt;

use crate::schema::EntitySchema;

use super::plan::QueryPlan;

/// Explain output for one query
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    /// Entity the query targets
    pub entity: String,
    /// Access path description
    pub access: String,
    /// Property whose index drives the access path
    pub index_property: Option<String>,
    /// The condition tree, rendered
    pub filter: String,
    /// One line per condition, depth-first
    pub parameters: Vec<String>,
    /// Sort keys, primary first
    pub order: Option<String>,
}

impl ExplainPlan {
    pub fn from_plan(schema: &EntitySchema, plan: &QueryPlan) -> Self {
        let index_property = plan
            .access
            .leaf()
            .and_then(|pos| plan.tree.leaf(pos))
            .map(|leaf| leaf.property().name.clone());

        Self {
            entity: schema.name().to_string(),
            access: plan.access.as_str().to_string(),
            index_property,
            filter: plan.tree.to_string(),
            parameters: plan.tree.leaves().iter().map(|c| c.to_string()).collect(),
            order: if plan.order.is_empty() {
                None
            } else {
                Some(plan.order.to_string())
            },
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== QUERY {} ===", self.entity)?;
        match &self.index_property {
            Some(property) => writeln!(f, "Access: {} on {}", self.access, property)?,
            None => writeln!(f, "Access: {}", self.access)?,
        }
        writeln!(f, "Filter: {}", self.filter)?;
        if !self.parameters.is_empty() {
            writeln!(f, "Conditions:")?;
            for parameter in &self.parameters {
                writeln!(f, "  - {}", parameter)?;
            }
        }
        if let Some(order) = &self.order {
            writeln!(f, "Order: {}", order)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{
        select_access_path, Condition, ConditionKind, ConditionTree, Operands, OrderFlags,
        OrderSpec, StringOrder,
    };
    use crate::schema::{EntityDef, PropertyDef, ValueType};

    fn schema() -> EntitySchema {
        EntitySchema::from_def(EntityDef {
            id: 1,
            name: "TestEntity".into(),
            properties: vec![
                PropertyDef::new(1, "simpleInt", ValueType::Int).indexed(),
                PropertyDef::new(2, "simpleString", ValueType::String),
            ],
        })
        .unwrap()
    }

    #[test]
    fn test_explain_indexed_plan() {
        let schema = schema();
        let int = schema.property("simpleInt").unwrap().clone();
        let text = schema.property("simpleString").unwrap().clone();
        let tree = ConditionTree::And(vec![ConditionTree::Leaf(
            Condition::new(
                int,
                ConditionKind::Equal,
                Operands::One(2007.into()),
                StringOrder::default(),
            )
            .unwrap(),
        )]);
        let mut order = OrderSpec::new();
        order.push(text, OrderFlags::DESCENDING);
        let plan = QueryPlan {
            access: select_access_path(&tree),
            tree,
            order,
        };

        let explain = ExplainPlan::from_plan(&schema, &plan);
        assert_eq!(explain.index_property.as_deref(), Some("simpleInt"));

        let output = explain.to_string();
        assert!(output.contains("Access: index equality on simpleInt"));
        assert!(output.contains("  - simpleInt == 2007"));
        assert!(output.contains("Order: simpleString (desc, nulls first)"));
        assert_eq!(output, ExplainPlan::from_plan(&schema, &plan).to_string());
    }

    #[test]
    fn test_explain_empty_plan() {
        let schema = schema();
        let plan = QueryPlan::default();
        let output = ExplainPlan::from_plan(&schema, &plan).to_string();
        assert!(output.contains("Access: full scan"));
        assert!(output.contains("Filter: TRUE"));
        assert!(!output.contains("Conditions:"));
    }
}
