use crate::domain::{Decimal, PnlResult, WalletRecord};

use super::EngineError;

/// Raw profit/loss of a wallet from its market-cap multiple.
///
/// `raw_pnl = invested * exit / entry - invested`. Records outside the valid
/// ranges (`invested >= 0`, `entry > 0`, `exit >= 0`) are reported, not coerced.
pub fn compute_pnl(wallet: &WalletRecord) -> Result<PnlResult, EngineError> {
    check_ranges(wallet)?;

    let overflow = || EngineError::Overflow {
        wallet_id: wallet.id.clone(),
    };
    let ratio = wallet
        .exit_market_cap
        .checked_div(wallet.entry_market_cap)
        .ok_or_else(overflow)?;
    let raw_pnl = wallet
        .invested_amount
        .checked_mul(ratio)
        .and_then(|grown| grown.checked_sub(wallet.invested_amount))
        .ok_or_else(overflow)?;
    let pnl_percentage = ratio
        .checked_sub(Decimal::one())
        .and_then(|growth| growth.checked_mul(Decimal::hundred()))
        .ok_or_else(overflow)?;

    Ok(PnlResult {
        raw_pnl,
        pnl_percentage,
        is_profit: raw_pnl.is_positive(),
    })
}

fn check_ranges(wallet: &WalletRecord) -> Result<(), EngineError> {
    if wallet.entry_market_cap.is_zero() {
        return Err(EngineError::DivisionByZero {
            wallet_id: wallet.id.clone(),
        });
    }

    let fields = [
        ("investedAmount", wallet.invested_amount),
        ("entryMarketCap", wallet.entry_market_cap),
        ("exitMarketCap", wallet.exit_market_cap),
    ];
    match fields.into_iter().find(|(_, value)| value.is_negative()) {
        Some((field, value)) => Err(EngineError::InvalidRecord {
            wallet_id: wallet.id.clone(),
            field,
            value,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn wallet(invested: &str, entry: &str, exit: &str) -> WalletRecord {
        WalletRecord::new("w1", "WaLLet1", "BONK", d(invested), d(entry), d(exit))
    }

    #[test]
    fn test_doubling_market_cap_doubles_investment() {
        let result = compute_pnl(&wallet("1000", "1000000", "2000000")).unwrap();
        assert_eq!(result.raw_pnl, d("1000"));
        assert_eq!(result.pnl_percentage, d("100"));
        assert!(result.is_profit);
    }

    #[test]
    fn test_halving_is_a_loss() {
        let result = compute_pnl(&wallet("1000", "2000000", "1000000")).unwrap();
        assert_eq!(result.raw_pnl, d("-500"));
        assert_eq!(result.pnl_percentage, d("-50"));
        assert!(!result.is_profit);
    }

    #[test]
    fn test_break_even_is_not_profit() {
        let result = compute_pnl(&wallet("1000", "5000", "5000")).unwrap();
        assert!(result.raw_pnl.is_zero());
        assert!(result.pnl_percentage.is_zero());
        assert!(!result.is_profit);
    }

    #[test]
    fn test_fully_exited_wallet_has_zero_pnl() {
        let result = compute_pnl(&wallet("0", "5000", "50000")).unwrap();
        assert!(result.raw_pnl.is_zero());
        assert_eq!(result.pnl_percentage, d("900"));
        assert!(!result.is_profit);
    }

    #[test]
    fn test_zero_entry_market_cap_is_reported() {
        let err = compute_pnl(&wallet("1000", "0", "5000")).unwrap_err();
        assert_eq!(
            err,
            EngineError::DivisionByZero {
                wallet_id: "w1".to_string()
            }
        );
    }

    #[test]
    fn test_exit_to_zero_loses_everything() {
        let result = compute_pnl(&wallet("250", "1000", "0")).unwrap();
        assert_eq!(result.raw_pnl, d("-250"));
        assert_eq!(result.pnl_percentage, d("-100"));
    }

    #[test]
    fn test_negative_fields_are_rejected() {
        let err = compute_pnl(&wallet("1000", "-100", "200")).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRecord {
                wallet_id: "w1".to_string(),
                field: "entryMarketCap",
                value: d("-100"),
            }
        );

        let err = compute_pnl(&wallet("-1", "100", "200")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRecord { field: "investedAmount", .. }));

        let err = compute_pnl(&wallet("1", "100", "-200")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRecord { field: "exitMarketCap", .. }));
    }

    #[test]
    fn test_overflowing_growth_is_reported() {
        let err = compute_pnl(&wallet("50000000000000000000000000000", "1", "2")).unwrap_err();
        assert_eq!(
            err,
            EngineError::Overflow {
                wallet_id: "w1".to_string()
            }
        );
    }
}
