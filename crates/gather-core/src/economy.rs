use serde::{Deserialize, Serialize};

/// The player's money.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    money: u32,
}

impl Wallet {
    pub fn new(money: u32) -> Self {
        Self { money }
    }

    pub fn money(&self) -> u32 {
        self.money
    }

    pub fn add(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }

    pub fn can_afford(&self, amount: u32) -> bool {
        self.money >= amount
    }

    /// Spend `amount` if the balance covers it.
    pub fn try_spend(&mut self, amount: u32) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.money -= amount;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spending_never_goes_negative() {
        let mut wallet = Wallet::new(100);
        assert!(wallet.try_spend(60));
        assert!(!wallet.try_spend(60));
        assert_eq!(wallet.money(), 40);
        wallet.add(50);
        assert!(wallet.can_afford(90));
    }
}
