use crate::error::{Error, Result};
use crate::tokenizer::{Token, TokenKind, tokenize};
use crate::{DataType, Value, ast::*};

/// Recursive-descent parser with one token of lookahead.
///
/// Every grammar rule is a method that consumes tokens left to right; the
/// first mismatch aborts the whole parse with [Error::Syntax].
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Statement> {
        let keyword = match self.peek() {
            Some(token) if token.kind == TokenKind::Keyword => token.text.clone(),
            Some(token) => return Err(Error::syntax(format!("unexpected token: {token}"))),
            None => return Err(Error::syntax("empty statement")),
        };

        let statement = match keyword.as_str() {
            "CREATE" => self.parse_create_table()?,
            "DROP" => self.parse_drop_table()?,
            "INSERT" => self.parse_insert()?,
            "SELECT" => self.parse_select()?,
            "UPDATE" => self.parse_update()?,
            "DELETE" => self.parse_delete()?,
            _ => return Err(Error::syntax(format!("unexpected keyword: {keyword}"))),
        };

        // semicolon is optional in SQL so skip it
        if self.matches(TokenKind::Semicolon, None) {
            self.advance()?;
        }

        // Check we are at the end of the statement
        if let Some(token) = self.peek() {
            return Err(Error::syntax(format!(
                "unexpected token after statement: {token}"
            )));
        }

        Ok(statement)
    }

    // helpers
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Result<Token> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| Error::syntax("unexpected end of input"))?;
        self.position += 1;
        Ok(token)
    }

    /// Lookahead test: does the current token have this kind (and text)?
    fn matches(&self, kind: TokenKind, text: Option<&str>) -> bool {
        self.peek()
            .is_some_and(|token| token.kind == kind && text.is_none_or(|t| token.text == t))
    }

    fn match_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|token| token.is_keyword(keyword))
    }

    /// Consumes the current token if it has this kind (and text), else fails.
    fn expect(&mut self, kind: TokenKind, text: Option<&str>) -> Result<Token> {
        if self.matches(kind, text) {
            return self.advance();
        }
        let expected = text.map_or_else(|| kind.to_string(), |t| format!("{t:?}"));
        let found = self
            .peek()
            .map_or_else(|| "end of input".to_string(), ToString::to_string);
        Err(Error::syntax(format!("expected {expected}, found {found}")))
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        self.expect(TokenKind::Keyword, Some(keyword)).map(|_| ())
    }

    fn consume_ident(&mut self) -> Result<String> {
        self.expect(TokenKind::Identifier, None).map(|t| t.text)
    }

    fn consume_data_type(&mut self) -> Result<DataType> {
        let token = self.expect(TokenKind::Keyword, None)?;
        DataType::from_keyword(&token.text)
            .ok_or_else(|| Error::syntax(format!("{token} is not a column type")))
    }

    /// `ident (',' ident)*`
    fn parse_ident_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.consume_ident()?];
        while self.matches(TokenKind::Comma, None) {
            self.advance()?;
            names.push(self.consume_ident()?);
        }
        Ok(names)
    }

    /// `string | integer | TRUE | FALSE`
    fn parse_literal(&mut self) -> Result<Value> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::String => Ok(Value::from(token.text.as_str())),
            TokenKind::Number => token
                .text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| Error::syntax(e.to_string())),
            TokenKind::Keyword if token.text == "TRUE" => Ok(Value::Bool(true)),
            TokenKind::Keyword if token.text == "FALSE" => Ok(Value::Bool(false)),
            _ => Err(Error::syntax(format!("expected a literal, found {token}"))),
        }
    }

    /// `'(' literal (',' literal)* ')'`
    fn parse_tuple(&mut self) -> Result<Vec<Value>> {
        self.expect(TokenKind::LeftParen, None)?;
        let mut values = vec![self.parse_literal()?];
        while self.matches(TokenKind::Comma, None) {
            self.advance()?;
            values.push(self.parse_literal()?);
        }
        self.expect(TokenKind::RightParen, None)?;
        Ok(values)
    }

    /// `ident ('.' ident)?`, returned as `parts.join(".")`.
    fn parse_column_ref(&mut self) -> Result<String> {
        let mut parts = vec![self.consume_ident()?];
        if self.matches(TokenKind::Dot, None) {
            self.advance()?;
            parts.push(self.consume_ident()?);
        }
        Ok(parts.join("."))
    }

    fn parse_operator(&mut self) -> Result<ComparisonOp> {
        let token = self.expect(TokenKind::Operator, None)?;
        ComparisonOp::from_symbol(&token.text)
            .ok_or_else(|| Error::syntax(format!("unknown operator {token}")))
    }

    /// `[WHERE column operator literal]`
    fn parse_optional_where(&mut self) -> Result<Option<WhereClause>> {
        if !self.match_keyword("WHERE") {
            return Ok(None);
        }
        self.expect_keyword("WHERE")?;
        let column = self.consume_ident()?;
        let op = self.parse_operator()?;
        let value = self.parse_literal()?;
        Ok(Some(WhereClause { column, op, value }))
    }

    fn parse_column_decl(&mut self) -> Result<ColumnDecl> {
        let name = self.consume_ident()?;
        let data_type = self.consume_data_type()?;

        let primary_key = if self.match_keyword("PRIMARY") {
            self.advance()?;
            self.expect_keyword("KEY")?;
            true
        } else {
            false
        };

        Ok(ColumnDecl {
            name,
            data_type,
            primary_key,
        })
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        self.expect_keyword("CREATE")?;
        self.expect_keyword("TABLE")?;
        let name = self.consume_ident()?;
        self.expect(TokenKind::LeftParen, None)?;
        let mut columns = vec![self.parse_column_decl()?];
        while self.matches(TokenKind::Comma, None) {
            self.advance()?;
            columns.push(self.parse_column_decl()?);
        }
        self.expect(TokenKind::RightParen, None)?;
        Ok(Statement::CreateTable(CreateTable { name, columns }))
    }

    fn parse_drop_table(&mut self) -> Result<Statement> {
        self.expect_keyword("DROP")?;
        self.expect_keyword("TABLE")?;
        let name = self.consume_ident()?;
        Ok(Statement::DropTable(DropTable { name }))
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table = self.consume_ident()?;

        let columns = if self.matches(TokenKind::LeftParen, None) {
            self.advance()?;
            let names = self.parse_ident_list()?;
            self.expect(TokenKind::RightParen, None)?;
            Some(names)
        } else {
            None
        };

        self.expect_keyword("VALUES")?;
        let mut rows = vec![self.parse_tuple()?];
        while self.matches(TokenKind::Comma, None) {
            self.advance()?;
            rows.push(self.parse_tuple()?);
        }

        Ok(Statement::InsertInto(InsertInto {
            table,
            columns,
            rows,
        }))
    }

    fn parse_select(&mut self) -> Result<Statement> {
        self.expect_keyword("SELECT")?;

        let columns = if self.matches(TokenKind::Asterisk, None) {
            self.advance()?;
            ColumnsSelect::Star
        } else {
            ColumnsSelect::ColumnsNames(self.parse_ident_list()?)
        };

        self.expect_keyword("FROM")?;
        let table = self.consume_ident()?;

        let join = if self.match_keyword("INNER") {
            self.advance()?;
            self.expect_keyword("JOIN")?;
            let joined = self.consume_ident()?;
            self.expect_keyword("ON")?;
            let left = self.parse_column_ref()?;
            self.expect(TokenKind::Operator, Some("="))?;
            let right = self.parse_column_ref()?;
            Some(JoinClause {
                table: joined,
                left,
                right,
            })
        } else {
            None
        };

        let where_clause = self.parse_optional_where()?;

        Ok(Statement::Select(Select {
            columns,
            table,
            join,
            where_clause,
        }))
    }

    fn parse_update(&mut self) -> Result<Statement> {
        self.expect_keyword("UPDATE")?;
        let table = self.consume_ident()?;
        self.expect_keyword("SET")?;

        let mut assignments = vec![];
        loop {
            let column = self.consume_ident()?;
            self.expect(TokenKind::Operator, Some("="))?;
            let value = self.parse_literal()?;
            assignments.push((column, value));

            if !self.matches(TokenKind::Comma, None) {
                break;
            }
            self.advance()?;
        }

        let where_clause = self.parse_optional_where()?;

        Ok(Statement::Update(Update {
            table,
            assignments,
            where_clause,
        }))
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table = self.consume_ident()?;
        let where_clause = self.parse_optional_where()?;
        Ok(Statement::Delete(Delete {
            table,
            where_clause,
        }))
    }
}

/// Tokenizes and parses a single statement.
pub fn parse(sql: &str) -> Result<Statement> {
    Parser::new(tokenize(sql)?).parse()
}
