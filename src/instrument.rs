//! Instrument resolution - pair parsing and token registry

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

/// A tradable pair: base asset priced in the quote asset
#[derive(Debug, Clone)]
pub struct Instrument {
    /// Pair symbol as configured, e.g. "SOL/USDC"
    pub symbol: String,
    pub base: TokenInfo,
    pub quote: TokenInfo,
}

impl Instrument {
    /// Resolve a pair symbol ("SOL/USDC", or a bare base symbol which
    /// defaults to a USDC quote) into its token pair.
    pub fn resolve(symbol: &str) -> Option<Instrument> {
        let (base_sym, quote_sym) = match symbol.split_once('/') {
            Some((b, q)) => (b, q),
            None => (symbol, "USDC"),
        };

        let base = get_token_info(base_sym)?;
        let quote = get_token_info(quote_sym)?;

        Some(Instrument {
            symbol: format!("{}/{}", base.symbol, quote.symbol),
            base,
            quote,
        })
    }
}

/// Get token info from the static mapping.
///
/// In production this should query the asset service instead of a
/// baked-in table.
pub fn get_token_info(symbol_or_address: &str) -> Option<TokenInfo> {
    let info = match symbol_or_address.to_uppercase().as_str() {
        "SOL" | "SO11111111111111111111111111111111111111112" => TokenInfo {
            address: "So11111111111111111111111111111111111111112".to_string(),
            symbol: "SOL".to_string(),
            decimals: 9,
        },
        "USDC" | "EPJFWDD5AUFQSSQEM2QN1XZYBAPC8G4WEGGKZWYTDT1V" => TokenInfo {
            address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            symbol: "USDC".to_string(),
            decimals: 6,
        },
        "BTC" | "WBTC" | "QFNQNLS3X2K5R3OCMS1NJWIKOK8TQ77PCH6ZTX8MR2F" => TokenInfo {
            address: "qfnqNLS3x2K5R3oCmS1NjwiKOK8Tq77pCH6zTX8mR2F".to_string(),
            symbol: "WBTC".to_string(),
            decimals: 8,
        },
        "ETH" | "WETH" | "7VFCXTUXX5WJV5JADK17DUJ4KSGAU7UTNKJ4B963VOXS" => TokenInfo {
            address: "7vfCXTUXx5WJV5JADk17DUJ4ksgau7utNKj4b963voxs".to_string(),
            symbol: "WETH".to_string(),
            decimals: 8,
        },
        "JUP" | "JUPYIWRYJFSKUPIHA7HKER8VUTAEFOSYBKEDZNSDVCN" => TokenInfo {
            address: "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN".to_string(),
            symbol: "JUP".to_string(),
            decimals: 6,
        },
        _ => return None,
    };
    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_pair_symbol() {
        let instrument = Instrument::resolve("SOL/USDC").unwrap();
        assert_eq!(instrument.base.symbol, "SOL");
        assert_eq!(instrument.quote.symbol, "USDC");
        assert_eq!(instrument.base.decimals, 9);
    }

    #[test]
    fn test_bare_symbol_defaults_to_usdc_quote() {
        let instrument = Instrument::resolve("ETH").unwrap();
        assert_eq!(instrument.symbol, "WETH/USDC");
        assert_eq!(instrument.quote.symbol, "USDC");
    }

    #[test]
    fn test_every_token_resolves_by_mint_address() {
        for (address, symbol) in [
            ("So11111111111111111111111111111111111111112", "SOL"),
            ("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "USDC"),
            ("qfnqNLS3x2K5R3oCmS1NjwiKOK8Tq77pCH6zTX8mR2F", "WBTC"),
            ("7vfCXTUXx5WJV5JADk17DUJ4ksgau7utNKj4b963voxs", "WETH"),
            ("JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN", "JUP"),
        ] {
            let info = get_token_info(address).unwrap();
            assert_eq!(info.symbol, symbol);
            assert_eq!(info.address, address);
        }
    }

    #[test]
    fn test_unknown_symbol_is_none() {
        assert!(Instrument::resolve("DOGE/USDC").is_none());
        assert!(get_token_info("NOPE").is_none());
    }
}
