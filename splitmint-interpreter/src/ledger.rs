use crate::CliResult;
use serde::Serialize;
use splitmint_domain::{
    BalanceAggregator, DebtSimplifier, Expense, Group, GroupBalances, LedgerPolicy, Member, Money,
    ParticipantId, Settlement, SplitCalculator, SplitStrategy, parse_declared_values,
};
use splitmint_parser::{Command, ExpenseEntry, Program, SplitKind, Statement};

/// Output requested by a ledger, in statement order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    Balances {
        line: Option<usize>,
        balances: GroupBalances,
    },
    Settlement {
        line: Option<usize>,
        settlement: Settlement,
    },
}

/// Group state built up while walking a ledger.
pub struct Ledger {
    group: Group,
    expenses: Vec<Expense>,
    total_spend: Money,
    calculator: SplitCalculator,
    simplifier: DebtSimplifier,
}

impl Ledger {
    pub fn new(group: Group, policy: LedgerPolicy) -> Self {
        Self {
            group,
            expenses: Vec::new(),
            total_spend: Money::ZERO,
            calculator: SplitCalculator::new(policy),
            simplifier: DebtSimplifier::new(policy),
        }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn set_budget(&mut self, member: &str, amount: Money, line: usize) -> CliResult<()> {
        let mut members = self.group.members().to_vec();
        let Some(target) = members.iter_mut().find(|m| m.id.as_str() == member) else {
            return Err(format!("Undefined member '{member}' at line {line}").into());
        };
        target.initial_balance = amount;
        self.group = Group::try_new(members).map_err(|err| err.to_string())?;
        Ok(())
    }

    pub fn add_expense(&mut self, entry: &ExpenseEntry<'_>, line: usize) -> CliResult<()> {
        let payer = self.member_id(entry.payer, line)?;
        let amount = Money::try_from_decimal(entry.amount)
            .map_err(|err| format!("Invalid amount at line {line}: {err}"))?;
        let total_spend = self.total_spend.checked_add(amount).ok_or_else(|| {
            format!(
                "Invalid amount at line {line}: ledger total exceeds {}",
                Money::MAX
            )
        })?;

        let named = entry.split.participants();
        let participants = if named.is_empty() {
            self.group.participant_ids()
        } else {
            named
                .into_iter()
                .map(|name| self.member_id(name, line))
                .collect::<CliResult<Vec<_>>>()?
        };

        let strategy = match entry.split.kind() {
            SplitKind::Equal => SplitStrategy::Equal,
            SplitKind::Exact => SplitStrategy::Exact,
            SplitKind::Percent => SplitStrategy::Percent,
        };
        let declared = match strategy {
            SplitStrategy::Equal => None,
            SplitStrategy::Exact | SplitStrategy::Percent => {
                Some(parse_declared_values(entry.split.declared().iter().copied()))
            }
        };

        let result = self
            .calculator
            .compute(amount, strategy, &participants, declared.as_ref())
            .map_err(|err| format!("Invalid split at line {line}: {err}"))?;

        let mut expense = Expense::from_split(amount, payer, strategy, result, declared.as_ref());
        if let Some(description) = entry.description {
            expense = expense.with_description(description);
        }
        tracing::debug!(
            line,
            payer = %expense.payer,
            amount = %expense.amount,
            strategy = %strategy,
            "Expense recorded"
        );
        self.expenses.push(expense);
        self.total_spend = total_spend;
        Ok(())
    }

    pub fn balances(&self) -> GroupBalances {
        BalanceAggregator.aggregate(&self.expenses, &self.group)
    }

    pub fn settle(&self) -> Settlement {
        self.simplifier.simplify(&self.balances().flow)
    }

    fn member_id(&self, name: &str, line: usize) -> CliResult<ParticipantId> {
        self.group
            .member(name)
            .map(|member| member.id.clone())
            .ok_or_else(|| format!("Undefined member '{name}' at line {line}").into())
    }
}

/// Walks `program` and collects one report per command. A ledger without
/// commands reports balances and settlement for the whole ledger.
pub fn evaluate(program: &Program<'_>, policy: LedgerPolicy) -> CliResult<Vec<Report>> {
    let mut statements = program.statements.iter();

    let group = match statements.next().map(|stmt| (stmt.line, &stmt.statement)) {
        Some((line, Statement::Members(names))) => {
            let members = names.iter().copied().map(Member::new).collect();
            Group::try_new(members).map_err(|err| format!("Invalid MEMBERS at line {line}: {err}"))?
        }
        _ => return Err("Ledger must start with a `MEMBERS := ...` declaration".into()),
    };
    let mut ledger = Ledger::new(group, policy);
    let mut reports = Vec::new();

    for stmt in statements {
        let line = stmt.line;
        match &stmt.statement {
            Statement::Members(_) => {
                return Err(format!("MEMBERS may only be declared once (line {line})").into());
            }
            Statement::Budget { member, amount } => {
                let amount = Money::try_from_decimal(*amount)
                    .map_err(|err| format!("Invalid budget at line {line}: {err}"))?;
                ledger.set_budget(member, amount, line)?;
            }
            Statement::Expense(entry) => ledger.add_expense(entry, line)?,
            Statement::Command(Command::Balances) => reports.push(Report::Balances {
                line: Some(line),
                balances: ledger.balances(),
            }),
            Statement::Command(Command::Settle) => reports.push(Report::Settlement {
                line: Some(line),
                settlement: ledger.settle(),
            }),
        }
    }

    if reports.is_empty() {
        reports.push(Report::Balances {
            line: None,
            balances: ledger.balances(),
        });
        reports.push(Report::Settlement {
            line: None,
            settlement: ledger.settle(),
        });
    }

    tracing::debug!(
        expense_count = ledger.expenses().len(),
        member_count = ledger.group().members().len(),
        report_count = reports.len(),
        "Ledger evaluated"
    );
    Ok(reports)
}
