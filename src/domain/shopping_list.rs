use std::fmt::Display;

use crate::{
    error::ApiError,
    jwt::SessionData,
    permissions::{authorize, ActionType, Resource},
    schema::ShoppingListLine,
    state::State,
};

impl Display for ShoppingListLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) — {}", self.name, self.measurement_unit, self.amount)
    }
}

/// Ingredient totals over every recipe in a user's cart.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingList {
    lines: Vec<ShoppingListLine>,
}

impl ShoppingList {
    pub fn new(lines: Vec<ShoppingListLine>) -> Self {
        Self { lines }
    }

    pub async fn for_user(state: &State, session: &SessionData) -> Result<Self, ApiError> {
        authorize(Some(session), ActionType::ManageOwnLists, Resource::Collection)
            .into_result()?;

        let lines = state.store.shopping_list(session.user_id).await?;
        log::debug!(
            "Shopping list of user {} has {} lines",
            session.user_id,
            lines.len()
        );

        Ok(Self::new(lines))
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("{line}\n"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, amount: i64) -> ShoppingListLine {
        ShoppingListLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn lines_render_one_per_row() {
        let list = ShoppingList::new(vec![line("Flour", "g", 150), line("Milk", "ml", 300)]);

        assert_eq!(list.render(), "Flour (g) — 150\nMilk (ml) — 300\n");
    }

    #[test]
    fn empty_cart_renders_nothing() {
        assert_eq!(ShoppingList::new(vec![]).render(), "");
    }
}
