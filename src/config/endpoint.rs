use std::fmt;

/// Every data endpoint exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Tokens,
    HourlyOhlcv,
    DailyOhlcv,
    InvestorGrades,
    TraderGrades,
    TraderIndices,
    MarketMetrics,
    TradingSignals,
    AiReports,
    InvestorIndices,
    CryptoInvestors,
    TopMarketCapTokens,
    ResistanceSupport,
    Price,
    Sentiment,
    Quantmetrics,
    ScenarioAnalysis,
    Correlation,
    IndexHoldings,
    SectorIndicesHoldings,
    IndicesPerformance,
    SectorIndicesPerformance,
    IndexTransaction,
    SectorIndexTransaction,
}

impl Endpoint {
    pub const ALL: [Endpoint; 24] = [
        Endpoint::Tokens,
        Endpoint::HourlyOhlcv,
        Endpoint::DailyOhlcv,
        Endpoint::InvestorGrades,
        Endpoint::TraderGrades,
        Endpoint::TraderIndices,
        Endpoint::MarketMetrics,
        Endpoint::TradingSignals,
        Endpoint::AiReports,
        Endpoint::InvestorIndices,
        Endpoint::CryptoInvestors,
        Endpoint::TopMarketCapTokens,
        Endpoint::ResistanceSupport,
        Endpoint::Price,
        Endpoint::Sentiment,
        Endpoint::Quantmetrics,
        Endpoint::ScenarioAnalysis,
        Endpoint::Correlation,
        Endpoint::IndexHoldings,
        Endpoint::SectorIndicesHoldings,
        Endpoint::IndicesPerformance,
        Endpoint::SectorIndicesPerformance,
        Endpoint::IndexTransaction,
        Endpoint::SectorIndexTransaction,
    ];

    /// Catalog key for this endpoint.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Tokens => "tokens",
            Endpoint::HourlyOhlcv => "hourly_ohlcv",
            Endpoint::DailyOhlcv => "daily_ohlcv",
            Endpoint::InvestorGrades => "investor_grades",
            Endpoint::TraderGrades => "trader_grades",
            Endpoint::TraderIndices => "trader_indices",
            Endpoint::MarketMetrics => "market_metrics",
            Endpoint::TradingSignals => "trading_signals",
            Endpoint::AiReports => "ai_reports",
            Endpoint::InvestorIndices => "investor_indices",
            Endpoint::CryptoInvestors => "crypto_investors",
            Endpoint::TopMarketCapTokens => "top_market_cap_tokens",
            Endpoint::ResistanceSupport => "resistance_support",
            Endpoint::Price => "price",
            Endpoint::Sentiment => "sentiment",
            Endpoint::Quantmetrics => "quantmetrics",
            Endpoint::ScenarioAnalysis => "scenario_analysis",
            Endpoint::Correlation => "correlation",
            Endpoint::IndexHoldings => "index_holdings",
            Endpoint::SectorIndicesHoldings => "sector_indices_holdings",
            Endpoint::IndicesPerformance => "indices_performance",
            Endpoint::SectorIndicesPerformance => "sector_indices_performance",
            Endpoint::IndexTransaction => "index_transaction",
            Endpoint::SectorIndexTransaction => "sector_index_transaction",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
